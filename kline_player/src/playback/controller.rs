use std::time::Duration;

use market_data::models::{bar::Bar, bar_series::first_unordered_index};

use crate::{
    error::PlayerError,
    playback::{
        ManualScheduler, PlaybackStatus, Speed, TickOutcome,
        scheduler::{Scheduler, TimerId},
    },
};

#[derive(Debug, Default)]
struct PlaybackState {
    cursor: usize,
    speed: Speed,
    status: PlaybackStatus,
    timer: Option<TimerId>,
}

/// Reveals `bars[0, cursor)` one bar per tick.
///
/// All mutation goes through `&mut self`; timer firings come back through
/// [`PlaybackController::on_timer`] and are matched against the single active
/// [`TimerId`], so a cancelled timer can never advance a newer series.
#[derive(Debug)]
pub struct PlaybackController<S> {
    scheduler: S,
    bars: Vec<Bar>,
    display_start: usize,
    state: PlaybackState,
}

impl<S: Scheduler> PlaybackController<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            bars: Vec::new(),
            display_start: 0,
            state: PlaybackState::default(),
        }
    }

    /// Replaces the series and positions the cursor just past `display_start`.
    ///
    /// Empty or unordered input leaves the controller cleared and `Idle`.
    pub fn load(&mut self, bars: Vec<Bar>, display_start: usize) -> Result<(), PlayerError> {
        self.cancel_timer();
        self.clear();

        if bars.is_empty() {
            return Err(PlayerError::EmptySeries);
        }
        if let Some(index) = first_unordered_index(&bars) {
            return Err(PlayerError::UnorderedSeries { index });
        }

        let last = bars.len() - 1;
        if display_start > last {
            tracing::warn!(display_start, len = bars.len(), "display start clamped to last bar");
        }
        self.display_start = display_start.min(last);
        self.bars = bars;
        self.state.cursor = self.display_start + 1;
        self.set_status(PlaybackStatus::Loaded);
        Ok(())
    }

    pub fn play(&mut self) -> Result<(), PlayerError> {
        match self.status() {
            PlaybackStatus::Playing => Err(self.invalid("play")),
            PlaybackStatus::Idle => Err(PlayerError::NothingToPlay),
            PlaybackStatus::Loaded | PlaybackStatus::Paused => {
                if self.state.cursor >= self.bars.len() {
                    return Err(PlayerError::NothingToPlay);
                }
                self.start_timer();
                self.set_status(PlaybackStatus::Playing);
                Ok(())
            }
        }
    }

    pub fn pause(&mut self) -> Result<(), PlayerError> {
        if self.status() != PlaybackStatus::Playing {
            return Err(self.invalid("pause"));
        }
        self.cancel_timer();
        self.set_status(PlaybackStatus::Paused);
        Ok(())
    }

    /// Cancels playback and drops the series. Always succeeds.
    pub fn stop(&mut self) {
        self.cancel_timer();
        self.clear();
    }

    /// Rewinds to the first display bar, paused.
    pub fn reset(&mut self) -> Result<(), PlayerError> {
        if self.status() == PlaybackStatus::Idle {
            return Err(self.invalid("reset"));
        }
        self.cancel_timer();
        self.state.cursor = self.display_start + 1;
        self.set_status(PlaybackStatus::Paused);
        Ok(())
    }

    /// Jumps to `percent` of the full buffer, resuming if it was playing.
    ///
    /// The target index is `floor(percent / 100 * len)` clamped to the last
    /// bar, and the cursor lands one past it so the target is visible.
    pub fn seek(&mut self, percent: f64) -> Result<(), PlayerError> {
        if self.status() == PlaybackStatus::Idle {
            return Err(self.invalid("seek"));
        }
        if !(0.0..=100.0).contains(&percent) {
            return Err(PlayerError::InvalidSeek(percent));
        }

        let was_playing = self.cancel_timer();
        let len = self.bars.len();
        let target = ((percent / 100.0) * len as f64).floor() as usize;
        self.state.cursor = target.min(len.saturating_sub(1)) + 1;

        if was_playing {
            if self.state.cursor < len {
                self.start_timer();
            } else {
                self.set_status(PlaybackStatus::Paused);
            }
        }
        tracing::debug!(percent, cursor = self.state.cursor, "seek");
        Ok(())
    }

    /// Changes the tick rate; a running timer is replaced at the new period.
    pub fn set_speed(&mut self, ticks_per_second: f64) -> Result<(), PlayerError> {
        let speed = Speed::new(ticks_per_second)?;
        self.state.speed = speed;
        if self.cancel_timer() {
            self.start_timer();
        }
        tracing::debug!(%speed, "speed changed");
        Ok(())
    }

    /// Delivers one firing of timer `id`.
    pub fn on_timer(&mut self, id: TimerId) -> TickOutcome {
        if self.state.timer != Some(id) {
            tracing::trace!(?id, "ignoring stale timer");
            return TickOutcome::Stale;
        }

        let len = self.bars.len();
        self.state.cursor = (self.state.cursor + 1).min(len);
        let cursor = self.state.cursor;
        if cursor >= len {
            self.cancel_timer();
            self.set_status(PlaybackStatus::Paused);
            tracing::info!(cursor, "playback finished");
            TickOutcome::Finished { cursor }
        } else {
            TickOutcome::Advanced { cursor }
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state.status
    }

    pub fn cursor(&self) -> usize {
        self.state.cursor
    }

    pub fn display_start(&self) -> usize {
        self.display_start
    }

    pub fn speed(&self) -> Speed {
        self.state.speed
    }

    /// True exactly while a progression timer is registered.
    pub fn is_running(&self) -> bool {
        self.state.timer.is_some()
    }

    pub fn active_timer(&self) -> Option<TimerId> {
        self.state.timer
    }

    /// The full loaded sequence, warm-up buffer included.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// `bars[0, cursor)`.
    pub fn visible_bars(&self) -> &[Bar] {
        &self.bars[..self.state.cursor]
    }

    /// `bars[display_start, cursor)`, empty before the display start.
    pub fn window_bars(&self) -> &[Bar] {
        let start = self.display_start.min(self.state.cursor);
        &self.bars[start..self.state.cursor]
    }

    /// `floor(cursor * 100 / len)`, 0 when nothing is loaded.
    pub fn buffer_progress(&self) -> u8 {
        percent_of(self.state.cursor, self.bars.len())
    }

    /// Progress through the display window only.
    pub fn window_progress(&self) -> u8 {
        percent_of(
            self.state.cursor.saturating_sub(self.display_start),
            self.bars.len().saturating_sub(self.display_start),
        )
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    fn start_timer(&mut self) {
        let period = self.state.speed.period();
        let id = self.scheduler.schedule_repeating(period);
        tracing::debug!(?id, ?period, "timer started");
        self.state.timer = Some(id);
    }

    /// Returns whether a timer was active.
    fn cancel_timer(&mut self) -> bool {
        match self.state.timer.take() {
            Some(id) => {
                self.scheduler.cancel(id);
                tracing::debug!(?id, "timer cancelled");
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        self.bars.clear();
        self.display_start = 0;
        self.state.cursor = 0;
        self.set_status(PlaybackStatus::Idle);
    }

    fn set_status(&mut self, status: PlaybackStatus) {
        let from = self.status();
        if from != status {
            tracing::debug!(%from, to = %status, cursor = self.state.cursor, "playback transition");
        }
        self.state.status = status;
    }

    fn invalid(&self, op: &'static str) -> PlayerError {
        PlayerError::InvalidTransition {
            op,
            state: self.status(),
        }
    }
}

impl PlaybackController<ManualScheduler> {
    /// Moves the virtual clock forward by `elapsed`, delivering every due
    /// firing in chronological order.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<TickOutcome> {
        let deadline = self.scheduler.now() + elapsed;
        let mut outcomes = Vec::new();
        while let Some(id) = self.scheduler.fire_next(deadline) {
            outcomes.push(self.on_timer(id));
        }
        outcomes
    }
}

fn percent_of(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    // part <= whole for every caller, so this fits in u8
    u8::try_from(part.min(whole) * 100 / whole).unwrap_or(100)
}
