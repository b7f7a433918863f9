//! Replays historical K-line data bar by bar with moving-average overlays.
//!
//! The pieces, bottom-up:
//! - [`indicators`] computes SMA / EMA / VWMA lines over a bar sequence.
//! - [`window`] widens a requested range by the warm-up those lines need.
//! - [`playback`] reveals the loaded sequence one bar per timer tick.
//! - [`overlay`] clips each line to the bars currently on screen.
//! - [`session`] ties them to a [`market_data::providers::DataProvider`] and
//!   renders [`session::Frame`]s.

pub mod config;
pub mod error;
pub mod indicators;
pub mod overlay;
pub mod playback;
pub mod session;
pub mod window;

pub use error::PlayerError;
pub use session::{Frame, KlineRequest, KlineViewer};
