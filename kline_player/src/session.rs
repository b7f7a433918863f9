//! A viewer session: one controller, the moving-average slots and the data
//! they are computed from, rendered on demand as a [`Frame`].

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use market_data::{
    models::{bar::Bar, request_params::BarsRequestParams, timeframe::TimeFrame},
    providers::DataProvider,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::PlayerError,
    indicators::{MaPoint, MovingAverageConfig, compute_spec},
    overlay,
    playback::{
        ManualScheduler, PlaybackController, PlaybackStatus, Scheduler, TickOutcome, TimerId,
    },
    window::{RequestedRange, SeriesWindow},
};

const WELCOME: &str = "Select a symbol and time range to load";

/// What the user asked to view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KlineRequest {
    pub symbol: String,
    pub timeframe: TimeFrame,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Read-only render view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct Frame<'a> {
    pub state: PlaybackStatus,
    /// `bars[0, cursor)`, warm-up buffer included.
    pub visible_bars: &'a [Bar],
    pub display_start: usize,
    /// Aligned moving-average lines keyed by slot label, in slot order.
    pub overlays: IndexMap<String, Vec<MaPoint>>,
    /// Progress through the requested display window.
    pub progress_percent: u8,
    /// Progress through the whole fetched buffer.
    pub buffer_progress_percent: u8,
    pub speed: f64,
    pub status: &'a str,
}

impl Frame<'_> {
    /// The most recently revealed bar.
    pub fn last_bar(&self) -> Option<&Bar> {
        self.visible_bars.last()
    }
}

#[derive(Debug)]
pub struct KlineViewer<S> {
    controller: PlaybackController<S>,
    ma_config: MovingAverageConfig,
    /// Full-buffer moving-average output per label; recomputed on load and
    /// config changes only.
    ma_lines: IndexMap<String, Vec<MaPoint>>,
    status: String,
}

impl<S: Scheduler> KlineViewer<S> {
    pub fn new(scheduler: S, ma_config: MovingAverageConfig) -> Self {
        Self {
            controller: PlaybackController::new(scheduler),
            ma_config,
            ma_lines: IndexMap::new(),
            status: WELCOME.to_string(),
        }
    }

    /// Fetches `request` plus the moving-average warm-up from `provider` and
    /// loads it, ready to play.
    ///
    /// On any failure the session is left stopped with the error as status.
    pub async fn load_range<P>(
        &mut self,
        provider: &P,
        request: KlineRequest,
    ) -> Result<(), PlayerError>
    where
        P: DataProvider + ?Sized,
    {
        let result = self.try_load_range(provider, request).await;
        self.record(result)
    }

    async fn try_load_range<P>(
        &mut self,
        provider: &P,
        request: KlineRequest,
    ) -> Result<(), PlayerError>
    where
        P: DataProvider + ?Sized,
    {
        let range = RequestedRange::new(request.start, request.end)?;
        self.stop();

        let active = self.ma_config.active()?;
        let window = SeriesWindow::resolve(
            range,
            active.iter().map(|(_, spec)| spec),
            request.timeframe.duration(),
        );
        let params = BarsRequestParams {
            symbol: request.symbol.clone(),
            timeframe: request.timeframe,
            start: window.fetch_start(),
            end: window.fetch_end(),
        };

        let series = provider
            .fetch_bars(params)
            .await
            .map_err(|e| PlayerError::DataUnavailable(e.to_string()))?;

        let display_start = window.display_start_index(&series.bars);
        let len = series.bars.len();
        let loaded = self.controller.load(series.bars, display_start);
        self.recompute_moving_averages();
        loaded?;

        tracing::info!(
            symbol = %request.symbol,
            timeframe = %request.timeframe,
            bars = len,
            display_start,
            "loaded range"
        );
        self.status = format!(
            "Loaded {len} bars for {} {} ({} warm-up)",
            request.symbol, request.timeframe, self.controller.display_start()
        );
        Ok(())
    }

    /// Loads pre-fetched bars and recomputes the overlays.
    pub fn load_bars(&mut self, bars: Vec<Bar>, display_start: usize) -> Result<(), PlayerError> {
        let result = self.controller.load(bars, display_start);
        self.recompute_moving_averages();
        self.record(result)?;
        self.status = format!("Loaded {} bars", self.controller.bars().len());
        Ok(())
    }

    pub fn play(&mut self) -> Result<(), PlayerError> {
        let result = self.controller.play();
        self.record(result)?;
        self.status = format!("Playing at {}", self.controller.speed());
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), PlayerError> {
        let result = self.controller.pause();
        self.record(result)?;
        self.status = "Paused".to_string();
        Ok(())
    }

    pub fn stop(&mut self) {
        self.controller.stop();
        self.ma_lines.clear();
        self.status = "Stopped".to_string();
    }

    pub fn reset(&mut self) -> Result<(), PlayerError> {
        let result = self.controller.reset();
        self.record(result)?;
        self.status = "Reset to start".to_string();
        Ok(())
    }

    pub fn seek(&mut self, percent: f64) -> Result<(), PlayerError> {
        let result = self.controller.seek(percent);
        self.record(result)?;
        self.status = format!("Jumped to {}%", self.controller.buffer_progress());
        Ok(())
    }

    pub fn set_speed(&mut self, ticks_per_second: f64) -> Result<(), PlayerError> {
        let result = self.controller.set_speed(ticks_per_second);
        self.record(result)?;
        self.status = format!("Speed set to {}", self.controller.speed());
        Ok(())
    }

    pub fn on_timer(&mut self, id: TimerId) -> TickOutcome {
        let outcome = self.controller.on_timer(id);
        if let TickOutcome::Finished { .. } = outcome {
            self.status = "Playback finished".to_string();
        }
        outcome
    }

    /// Swaps the moving-average slots without moving the cursor.
    pub fn update_moving_average_config(
        &mut self,
        config: MovingAverageConfig,
    ) -> Result<(), PlayerError> {
        let result = config.active().map(|_| ());
        self.record(result)?;
        self.ma_config = config;
        self.recompute_moving_averages();
        Ok(())
    }

    pub fn frame(&self) -> Frame<'_> {
        let window = self.controller.window_bars();
        let target = if window.is_empty() {
            self.controller.visible_bars()
        } else {
            window
        };
        let overlays = self
            .ma_lines
            .iter()
            .map(|(label, points)| (label.clone(), overlay::align(points, target)))
            .collect();

        Frame {
            state: self.controller.status(),
            visible_bars: self.controller.visible_bars(),
            display_start: self.controller.display_start(),
            overlays,
            progress_percent: self.controller.window_progress(),
            buffer_progress_percent: self.controller.buffer_progress(),
            speed: self.controller.speed().get(),
            status: &self.status,
        }
    }

    pub fn status_message(&self) -> &str {
        &self.status
    }

    pub fn moving_average_config(&self) -> &MovingAverageConfig {
        &self.ma_config
    }

    pub fn controller(&self) -> &PlaybackController<S> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PlaybackController<S> {
        &mut self.controller
    }

    fn recompute_moving_averages(&mut self) {
        self.ma_lines.clear();
        let bars = self.controller.bars();
        if bars.is_empty() {
            return;
        }
        // invalid slots were rejected before they could be stored
        let Ok(active) = self.ma_config.active() else {
            return;
        };
        for (label, spec) in active {
            let points = compute_spec(bars, &spec);
            tracing::debug!(%label, points = points.len(), "moving average computed");
            self.ma_lines.insert(label, points);
        }
    }

    fn record<T>(&mut self, result: Result<T, PlayerError>) -> Result<T, PlayerError> {
        if let Err(e) = &result {
            tracing::warn!(error = %e, "operation rejected");
            self.status = e.to_string();
        }
        result
    }
}

impl KlineViewer<ManualScheduler> {
    /// Moves the virtual clock forward, routing every due firing through
    /// [`KlineViewer::on_timer`].
    pub fn advance(&mut self, elapsed: std::time::Duration) -> Vec<TickOutcome> {
        let deadline = self.controller.scheduler().now() + elapsed;
        let mut outcomes = Vec::new();
        while let Some(id) = self.controller.scheduler_mut().fire_next(deadline) {
            outcomes.push(self.on_timer(id));
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use market_data::{
        models::bar_series::BarSeries,
        providers::memory::MemoryProvider,
    };

    use super::*;
    use crate::indicators::{MaKind, MovingAverageSlot};

    fn t(i: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(i)
    }

    fn hourly(n: i64) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let c = 100.0 + (i % 7) as f64;
                Bar::new(t(i), c, c + 1.0, c - 1.0, c, 5.0).unwrap()
            })
            .collect()
    }

    fn sma_config(period: u16) -> MovingAverageConfig {
        let mut cfg = MovingAverageConfig::none();
        cfg.short = MovingAverageSlot::new(true, MaKind::Sma, period);
        cfg
    }

    fn viewer(cfg: MovingAverageConfig) -> KlineViewer<ManualScheduler> {
        KlineViewer::new(ManualScheduler::new(), cfg)
    }

    fn provider() -> MemoryProvider {
        MemoryProvider::new().with_series(BarSeries::new("BTCUSDT", TimeFrame::H1, hourly(300)))
    }

    fn request(start: i64, end: i64) -> KlineRequest {
        KlineRequest {
            symbol: "BTCUSDT".to_string(),
            timeframe: TimeFrame::H1,
            start: t(start),
            end: t(end),
        }
    }

    #[tokio::test]
    async fn load_range_fetches_warm_up_before_start() {
        let mut v = viewer(sma_config(20));
        v.load_range(&provider(), request(150, 200)).await.unwrap();

        let c = v.controller();
        assert_eq!(c.status(), PlaybackStatus::Loaded);
        assert_eq!(c.bars().len(), 150);
        assert_eq!(c.bars()[0].open_time, t(50));
        assert_eq!(c.display_start(), 100);
        assert_eq!(c.cursor(), 101);

        let frame = v.frame();
        let line = &frame.overlays["short SMA(20)"];
        assert_eq!(line.len(), 1);
        assert_eq!(line[0].time, t(150));
    }

    #[tokio::test]
    async fn unknown_symbol_maps_to_data_unavailable() {
        let mut v = viewer(MovingAverageConfig::default());
        let mut req = request(150, 200);
        req.symbol = "DOGEUSDT".to_string();
        let err = v.load_range(&provider(), req).await.unwrap_err();
        assert!(matches!(err, PlayerError::DataUnavailable(ref m) if m.contains("DOGEUSDT")));
        assert_eq!(v.controller().status(), PlaybackStatus::Idle);
        assert_eq!(v.status_message(), err.to_string());
    }

    #[tokio::test]
    async fn invalid_range_keeps_current_playback() {
        let mut v = viewer(MovingAverageConfig::default());
        v.load_range(&provider(), request(150, 200)).await.unwrap();
        let err = v.load_range(&provider(), request(200, 200)).await.unwrap_err();
        assert!(matches!(err, PlayerError::InvalidRange { .. }));
        assert_eq!(v.controller().status(), PlaybackStatus::Loaded);
    }

    #[test]
    fn overlays_follow_the_cursor() {
        let mut v = viewer(sma_config(3));
        v.load_bars(hourly(20), 10).unwrap();
        v.play().unwrap();
        v.advance(std::time::Duration::from_secs(4));

        let frame = v.frame();
        assert_eq!(frame.visible_bars.len(), 15);
        let line = &frame.overlays["short SMA(3)"];
        assert_eq!(line.first().unwrap().time, t(10));
        assert_eq!(line.last().unwrap().time, t(14));
        assert_eq!(frame.progress_percent, 50);
        assert_eq!(frame.buffer_progress_percent, 75);
        assert_eq!(frame.state, PlaybackStatus::Playing);
    }

    #[test]
    fn config_change_keeps_cursor() {
        let mut v = viewer(sma_config(3));
        v.load_bars(hourly(20), 10).unwrap();
        v.seek(80.0).unwrap();
        let cursor = v.controller().cursor();

        let mut cfg = sma_config(5);
        cfg.long = MovingAverageSlot::new(true, MaKind::Ema, 4);
        v.update_moving_average_config(cfg).unwrap();

        assert_eq!(v.controller().cursor(), cursor);
        let labels: Vec<_> = v.frame().overlays.keys().cloned().collect();
        assert_eq!(labels, ["short SMA(5)", "long EMA(4)"]);

        let mut bad = cfg;
        bad.medium = MovingAverageSlot::new(true, MaKind::Sma, 0);
        assert_eq!(
            v.update_moving_average_config(bad),
            Err(PlayerError::InvalidPeriod(0))
        );
        assert_eq!(v.moving_average_config(), &cfg);
    }

    #[test]
    fn errors_become_the_status_message() {
        let mut v = viewer(MovingAverageConfig::default());
        assert_eq!(v.frame().status, WELCOME);
        assert!(v.pause().is_err());
        assert_eq!(v.status_message(), "cannot pause while idle");
        assert!(v.set_speed(-1.0).is_err());
        assert_eq!(v.status_message(), "speed must be a positive number, got -1");
    }

    #[test]
    fn finished_playback_reports_status() {
        let mut v = viewer(MovingAverageConfig::none());
        v.load_bars(hourly(3), 0).unwrap();
        v.play().unwrap();
        let outcomes = v.advance(std::time::Duration::from_secs(5));
        assert_eq!(outcomes.len(), 2);
        assert!(v.frame().overlays.is_empty());
        assert_eq!(v.controller().status(), PlaybackStatus::Paused);
        assert_eq!(v.status_message(), "Playback finished");
    }
}
