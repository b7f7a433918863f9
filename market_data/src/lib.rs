//! Market data models and sources for the K-line player.
//!
//! The crate is deliberately free of any playback logic: it only knows how to
//! describe bars, decode them from the exchange kline format, resample them
//! into coarser timeframes, and hand them out through [`providers::DataProvider`].

pub mod catalog;
pub mod models;
pub mod providers;
pub mod resample;
pub mod wire;
