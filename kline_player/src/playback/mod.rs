//! Timer-driven progressive reveal of a loaded bar sequence.

mod controller;
mod scheduler;
mod tokio_scheduler;

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

pub use controller::PlaybackController;
pub use scheduler::{ManualScheduler, Scheduler, TimerId};
pub use tokio_scheduler::TokioScheduler;

use crate::error::PlayerError;

/// Shortest tick period; faster speeds are clamped to it.
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);
/// Longest tick period; slower speeds are clamped to it.
pub const MAX_TICK_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    /// Nothing loaded.
    #[default]
    Idle,
    /// Loaded and never started.
    Loaded,
    Playing,
    /// Stopped mid-sequence, at the end, or after a reset.
    Paused,
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlaybackStatus::Idle => "idle",
            PlaybackStatus::Loaded => "loaded",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
        })
    }
}

/// Result of delivering one timer firing to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The timer is not the active one; nothing changed.
    Stale,
    Advanced { cursor: usize },
    /// The last bar was revealed and playback paused.
    Finished { cursor: usize },
}

impl TickOutcome {
    /// Whether the tick changed anything visible.
    pub fn is_progress(&self) -> bool {
        !matches!(self, TickOutcome::Stale)
    }
}

/// Playback speed in ticks per second.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Speed(f64);

impl Speed {
    pub fn new(ticks_per_second: f64) -> Result<Self, PlayerError> {
        if !ticks_per_second.is_finite() || ticks_per_second <= 0.0 {
            return Err(PlayerError::InvalidSpeed(ticks_per_second));
        }
        Ok(Self(ticks_per_second))
    }

    pub fn get(&self) -> f64 {
        self.0
    }

    /// Time between ticks, `1 / speed` seconds clamped to
    /// `[MIN_TICK_PERIOD, MAX_TICK_PERIOD]`.
    pub fn period(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.0)
            .unwrap_or(MAX_TICK_PERIOD)
            .clamp(MIN_TICK_PERIOD, MAX_TICK_PERIOD)
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self(1.0)
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}
