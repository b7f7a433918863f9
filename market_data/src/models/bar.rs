//! Canonical in-memory representation of a time-series bar (OHLCV).
//!
//! This struct is the standard output of every [`DataProvider`](crate::providers::DataProvider)
//! and the unit the player replays.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a bar is rejected by [`Bar::new`].
#[derive(Debug, Error, PartialEq)]
pub enum BarError {
    #[error("prices must be positive and finite (open={open}, high={high}, low={low}, close={close})")]
    NonPositivePrice {
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },

    #[error("inconsistent range: low={low} open={open} close={close} high={high}")]
    InconsistentRange {
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },

    #[error("volume must be non-negative and finite, got {0}")]
    InvalidVolume(f64),
}

/// A single time-series bar (OHLCV) for one interval.
///
/// `open_time` is the identity key of the bar within a series: a series never
/// holds two bars with the same open time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Start of the bar interval (UTC).
    pub open_time: DateTime<Utc>,

    /// Opening price.
    pub open: f64,

    /// Highest price during the bar interval.
    pub high: f64,

    /// Lowest price during the bar interval.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Volume traded during the bar interval.
    pub volume: f64,
}

impl Bar {
    /// Builds a bar, checking `low <= min(open, close) <= max(open, close) <= high`
    /// and a non-negative volume.
    pub fn new(
        open_time: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, BarError> {
        let bar = Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
        };
        bar.validate()?;
        Ok(bar)
    }

    /// Checks the OHLCV invariants of an already constructed bar.
    pub fn validate(&self) -> Result<(), BarError> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(BarError::NonPositivePrice {
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }

        let body_low = self.open.min(self.close);
        let body_high = self.open.max(self.close);
        if self.low > body_low || body_high > self.high {
            return Err(BarError::InconsistentRange {
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }

        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(BarError::InvalidVolume(self.volume));
        }
        Ok(())
    }

    /// Open time in Unix milliseconds, the unit the exchange wire format uses.
    pub fn open_time_ms(&self) -> i64 {
        self.open_time.timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn accepts_consistent_bar() {
        let bar = Bar::new(t0(), 10.0, 12.0, 9.5, 11.0, 3.0).unwrap();
        assert_eq!(bar.close, 11.0);
        assert_eq!(bar.open_time_ms(), 1_704_067_200_000);
    }

    #[test]
    fn accepts_doji_with_zero_volume() {
        assert!(Bar::new(t0(), 10.0, 10.0, 10.0, 10.0, 0.0).is_ok());
    }

    #[test]
    fn rejects_high_below_body() {
        let err = Bar::new(t0(), 10.0, 10.5, 9.0, 11.0, 1.0).unwrap_err();
        assert!(matches!(err, BarError::InconsistentRange { .. }));
    }

    #[test]
    fn rejects_low_above_body() {
        let err = Bar::new(t0(), 10.0, 12.0, 10.5, 11.0, 1.0).unwrap_err();
        assert!(matches!(err, BarError::InconsistentRange { .. }));
    }

    #[test]
    fn rejects_non_positive_or_nan_prices() {
        assert!(matches!(
            Bar::new(t0(), 0.0, 1.0, 0.0, 1.0, 1.0),
            Err(BarError::NonPositivePrice { .. })
        ));
        assert!(matches!(
            Bar::new(t0(), f64::NAN, 1.0, 0.5, 1.0, 1.0),
            Err(BarError::NonPositivePrice { .. })
        ));
    }

    #[test]
    fn rejects_negative_volume() {
        assert_eq!(
            Bar::new(t0(), 1.0, 1.0, 1.0, 1.0, -2.0).unwrap_err(),
            BarError::InvalidVolume(-2.0)
        );
    }
}
