use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::playback::PlaybackStatus;

/// The unified error type for the `kline_player` crate.
///
/// Every variant is recoverable: the controller is left in a well-defined
/// state with no timer registered on its behalf.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlayerError {
    /// `load` was given zero bars.
    #[error("no bars to load")]
    EmptySeries,

    /// `play` was called with no data or with the cursor already at the end.
    #[error("nothing to play: already at the end of the series")]
    NothingToPlay,

    /// The requested range is empty or inverted.
    #[error("invalid range: start {start} must be before end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// The data collaborator could not serve the range; the message is its own.
    #[error("{0}")]
    DataUnavailable(String),

    /// An operation was called in a state that does not allow it.
    #[error("cannot {op} while {state}")]
    InvalidTransition {
        op: &'static str,
        state: PlaybackStatus,
    },

    #[error("seek position must be within 0..=100, got {0}")]
    InvalidSeek(f64),

    #[error("speed must be a positive number, got {0}")]
    InvalidSpeed(f64),

    #[error("moving average period must be within 1..=200, got {0}")]
    InvalidPeriod(u16),

    /// Bars are not strictly increasing by open time.
    #[error("bar {index} does not open after its predecessor")]
    UnorderedSeries { index: usize },

    #[error("configuration error: {0}")]
    Config(String),
}
