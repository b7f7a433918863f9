//! Mapping between a requested display range and the lookback-padded fetch.
//!
//! The user asks for `[start, end)`. Moving averages need warm-up bars before
//! `start`, so the fetch is widened by a buffer of whole intervals and the
//! first bar at or after `start` becomes the display start inside the fetched
//! sequence.

use chrono::{DateTime, Duration, Utc};
use market_data::models::bar::Bar;
use serde::Serialize;

use crate::{error::PlayerError, indicators::MovingAverageSpec};

/// Warm-up floor applied even when no moving average is active.
pub const MIN_BUFFER_PERIODS: u16 = 100;

/// A non-empty `[start, end)` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequestedRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl RequestedRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, PlayerError> {
        if start >= end {
            return Err(PlayerError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// Resolved fetch range for one requested range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesWindow {
    requested: RequestedRange,
    buffer_periods: u16,
    fetch_start: DateTime<Utc>,
    fetch_end: DateTime<Utc>,
}

impl SeriesWindow {
    /// Pads `requested` with `max(largest active period, 100)` intervals.
    pub fn resolve<'a>(
        requested: RequestedRange,
        active_specs: impl IntoIterator<Item = &'a MovingAverageSpec>,
        interval: Duration,
    ) -> Self {
        let buffer_periods = buffer_periods(active_specs);
        let fetch_start = interval
            .checked_mul(i32::from(buffer_periods))
            .and_then(|padding| requested.start.checked_sub_signed(padding))
            .unwrap_or_else(|| {
                tracing::warn!(
                    start = %requested.start,
                    %interval,
                    "lookback out of range, fetching from the earliest time"
                );
                DateTime::<Utc>::MIN_UTC
            });

        tracing::debug!(
            start = %requested.start,
            %fetch_start,
            buffer_periods,
            "resolved series window"
        );

        Self {
            requested,
            buffer_periods,
            fetch_start,
            fetch_end: requested.end,
        }
    }

    pub fn requested(&self) -> RequestedRange {
        self.requested
    }

    pub fn buffer_periods(&self) -> u16 {
        self.buffer_periods
    }

    pub fn fetch_start(&self) -> DateTime<Utc> {
        self.fetch_start
    }

    pub fn fetch_end(&self) -> DateTime<Utc> {
        self.fetch_end
    }

    /// Index of the first fetched bar opening at or after the requested start.
    ///
    /// Falls back to 0 when every bar precedes the start (sparse data), which
    /// makes the whole fetched sequence visible instead of nothing.
    pub fn display_start_index(&self, bars: &[Bar]) -> usize {
        match index_at_or_after(bars, self.requested.start) {
            Some(i) => i,
            None => {
                if !bars.is_empty() {
                    tracing::warn!(
                        start = %self.requested.start,
                        bars = bars.len(),
                        "no bar at or after requested start, showing full buffer"
                    );
                }
                0
            }
        }
    }

    /// Index of the bar covering `time` inside a fetched sequence.
    pub fn resolve_index(bars: &[Bar], time: DateTime<Utc>) -> Option<usize> {
        resolve_index(bars, time)
    }
}

/// `max(largest period, MIN_BUFFER_PERIODS)`.
pub fn buffer_periods<'a>(active_specs: impl IntoIterator<Item = &'a MovingAverageSpec>) -> u16 {
    active_specs
        .into_iter()
        .map(MovingAverageSpec::period)
        .fold(MIN_BUFFER_PERIODS, u16::max)
}

/// First index whose bar opens at or after `time`.
pub fn index_at_or_after(bars: &[Bar], time: DateTime<Utc>) -> Option<usize> {
    let i = bars.partition_point(|b| b.open_time < time);
    (i < bars.len()).then_some(i)
}

/// Index of the bar covering `time`: the last bar opening at or before it.
pub fn resolve_index(bars: &[Bar], time: DateTime<Utc>) -> Option<usize> {
    bars.partition_point(|b| b.open_time <= time).checked_sub(1)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::indicators::MaKind;

    const NO_SPECS: [&MovingAverageSpec; 0] = [];

    fn t(hour: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
    }

    fn hourly(from: i64, to: i64) -> Vec<Bar> {
        (from..to)
            .map(|h| Bar::new(t(h), 1.0, 1.0, 1.0, 1.0, 1.0).unwrap())
            .collect()
    }

    #[test]
    fn range_must_be_non_empty() {
        assert!(RequestedRange::new(t(0), t(1)).is_ok());
        assert_eq!(
            RequestedRange::new(t(1), t(1)),
            Err(PlayerError::InvalidRange {
                start: t(1),
                end: t(1)
            })
        );
        assert!(RequestedRange::new(t(2), t(1)).is_err());
    }

    #[test]
    fn buffer_floor_without_specs() {
        assert_eq!(buffer_periods(NO_SPECS), 100);
        let range = RequestedRange::new(t(200), t(300)).unwrap();
        let w = SeriesWindow::resolve(range, NO_SPECS, Duration::hours(1));
        assert_eq!(w.buffer_periods(), 100);
        assert_eq!(w.fetch_start(), t(100));
        assert_eq!(w.fetch_end(), t(300));
    }

    #[test]
    fn buffer_follows_largest_period() {
        let small = MovingAverageSpec::new(MaKind::Sma, 20).unwrap();
        let big = MovingAverageSpec::new(MaKind::Ema, 150).unwrap();
        assert_eq!(buffer_periods([&small]), 100);
        assert_eq!(buffer_periods([&small, &big]), 150);

        let range = RequestedRange::new(t(200), t(300)).unwrap();
        let w = SeriesWindow::resolve(range, [&big], Duration::hours(1));
        assert_eq!(w.fetch_start(), t(50));
    }

    #[test]
    fn oversized_lookback_clamps_to_earliest_time() {
        let range = RequestedRange::new(t(0), t(1)).unwrap();
        let w = SeriesWindow::resolve(range, NO_SPECS, Duration::days(2_000_000_000));
        assert_eq!(w.fetch_start(), DateTime::<Utc>::MIN_UTC);
        assert_eq!(w.fetch_end(), t(1));
    }

    #[test]
    fn display_start_is_first_bar_at_or_after_start() {
        let range = RequestedRange::new(t(10), t(20)).unwrap();
        let w = SeriesWindow::resolve(range, NO_SPECS, Duration::hours(1));
        assert_eq!(w.display_start_index(&hourly(0, 20)), 10);

        // gap in data right at the start
        let mut bars = hourly(0, 9);
        bars.extend(hourly(12, 20));
        assert_eq!(w.display_start_index(&bars), 9);
    }

    #[test]
    fn display_start_falls_back_to_zero() {
        let range = RequestedRange::new(t(50), t(60)).unwrap();
        let w = SeriesWindow::resolve(range, NO_SPECS, Duration::hours(1));
        assert_eq!(w.display_start_index(&hourly(0, 10)), 0);
        assert_eq!(w.display_start_index(&[]), 0);
    }

    #[test]
    fn resolve_index_finds_covering_bar() {
        let bars = hourly(0, 5);
        assert_eq!(resolve_index(&bars, t(2)), Some(2));
        assert_eq!(resolve_index(&bars, t(2) + Duration::minutes(30)), Some(2));
        assert_eq!(resolve_index(&bars, t(-1)), None);
        assert_eq!(resolve_index(&bars, t(99)), Some(4));
    }
}
