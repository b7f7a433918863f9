//! Timeframe utilities for expressing uniform bar intervals.
//!
//! A [`TimeFrame`] pairs a non-zero amount with a [`TimeFrameUnit`]. Every unit
//! has a fixed length, so a timeframe always converts to a
//! [`chrono::Duration`] for window padding and resampling.
//!
//! Typical usage:
//! ```
//! use market_data::models::timeframe::TimeFrame;
//!
//! let tf: TimeFrame = "15m".parse().unwrap();
//! assert_eq!(tf, TimeFrame::M15);
//! assert_eq!(tf.duration(), chrono::Duration::minutes(15));
//! assert_eq!(tf.base_timeframe(), TimeFrame::M5);
//! ```

use std::{fmt, num::NonZeroU32, str::FromStr};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeFrameError {
    #[error("Invalid amount in timeframe '{input}': must be a positive integer")]
    InvalidAmount { input: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

/// Timeframe granularity. All units are fixed-length in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeFrameUnit {
    Minute,
    Hour,
    Day,
    /// Seven days; buckets are epoch aligned, not Monday aligned.
    Week,
}

/// A timeframe = amount × unit (e.g. 5-Minute, 4-Hour, 1-Week).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeFrame {
    pub amount: NonZeroU32,
    pub unit: TimeFrameUnit,
}

const fn nz(n: u32) -> NonZeroU32 {
    match NonZeroU32::new(n) {
        Some(v) => v,
        None => panic!("timeframe amount must be non-zero"),
    }
}

impl TimeFrame {
    pub const M5: TimeFrame = TimeFrame::new(nz(5), TimeFrameUnit::Minute);
    pub const M15: TimeFrame = TimeFrame::new(nz(15), TimeFrameUnit::Minute);
    pub const H1: TimeFrame = TimeFrame::new(nz(1), TimeFrameUnit::Hour);
    pub const H4: TimeFrame = TimeFrame::new(nz(4), TimeFrameUnit::Hour);
    pub const D1: TimeFrame = TimeFrame::new(nz(1), TimeFrameUnit::Day);
    pub const W1: TimeFrame = TimeFrame::new(nz(1), TimeFrameUnit::Week);

    /// Intervals served by the kline feed; parsing accepts only these codes.
    pub const SUPPORTED: [TimeFrame; 6] = [
        TimeFrame::M5,
        TimeFrame::M15,
        TimeFrame::H1,
        TimeFrame::H4,
        TimeFrame::D1,
        TimeFrame::W1,
    ];

    pub const fn new(amount: NonZeroU32, unit: TimeFrameUnit) -> Self {
        Self { amount, unit }
    }

    pub const fn amount(&self) -> NonZeroU32 {
        self.amount
    }

    pub const fn unit(&self) -> TimeFrameUnit {
        self.unit
    }

    /// Length of one bar.
    pub fn duration(&self) -> Duration {
        let a = i64::from(self.amount.get());
        match self.unit {
            TimeFrameUnit::Minute => Duration::minutes(a),
            TimeFrameUnit::Hour => Duration::hours(a),
            TimeFrameUnit::Day => Duration::days(a),
            TimeFrameUnit::Week => Duration::weeks(a),
        }
    }

    /// Length of one bar in milliseconds.
    pub fn millis(&self) -> i64 {
        self.duration().num_milliseconds()
    }

    /// The stored timeframe this one is aggregated from.
    ///
    /// Only 5-minute and hourly bars are kept at the source; minute multiples
    /// of five derive from `5m`, everything from an hour upwards derives from
    /// `1h`. Timeframes that fit neither rule are their own base.
    pub fn base_timeframe(&self) -> TimeFrame {
        match self.unit {
            TimeFrameUnit::Minute if self.amount.get() % 5 == 0 => TimeFrame::M5,
            TimeFrameUnit::Minute => *self,
            TimeFrameUnit::Hour | TimeFrameUnit::Day | TimeFrameUnit::Week => TimeFrame::H1,
        }
    }

    pub fn is_supported(&self) -> bool {
        Self::SUPPORTED.contains(self)
    }

    /// True when bars of this timeframe come straight from the source.
    pub fn is_base(&self) -> bool {
        self.base_timeframe() == *self
    }
}

/// Display/parse use the exchange interval codes (`"5m"`, `"4h"`, `"1d"`, `"1w"`).
impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.amount.get();
        let u = match self.unit {
            TimeFrameUnit::Minute => "m",
            TimeFrameUnit::Hour => "h",
            TimeFrameUnit::Day => "d",
            TimeFrameUnit::Week => "w",
        };
        write!(f, "{a}{u}")
    }
}

impl FromStr for TimeFrame {
    type Err = TimeFrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some(unit_char) = s.chars().last() else {
            return Err(TimeFrameError::InvalidInput {
                message: "empty timeframe".into(),
            });
        };
        let digits = &s[..s.len() - unit_char.len_utf8()];
        let unit = match unit_char {
            'm' => TimeFrameUnit::Minute,
            'h' | 'H' => TimeFrameUnit::Hour,
            'd' | 'D' => TimeFrameUnit::Day,
            'w' | 'W' => TimeFrameUnit::Week,
            other => {
                return Err(TimeFrameError::InvalidInput {
                    message: format!("unknown timeframe unit '{other}' in '{s}'"),
                });
            }
        };
        let amount = digits
            .parse::<u32>()
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| TimeFrameError::InvalidAmount { input: s.to_string() })?;
        let tf = TimeFrame::new(amount, unit);
        if !tf.is_supported() {
            return Err(TimeFrameError::InvalidInput {
                message: format!("unsupported interval '{s}', expected one of 5m, 15m, 1h, 4h, 1d, 1w"),
            });
        }
        Ok(tf)
    }
}

impl TryFrom<String> for TimeFrame {
    type Error = TimeFrameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeFrame> for String {
    fn from(tf: TimeFrame) -> Self {
        tf.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_codes() {
        assert_eq!("5m".parse::<TimeFrame>().unwrap(), TimeFrame::M5);
        assert_eq!("15m".parse::<TimeFrame>().unwrap(), TimeFrame::M15);
        assert_eq!("1h".parse::<TimeFrame>().unwrap(), TimeFrame::H1);
        assert_eq!("4h".parse::<TimeFrame>().unwrap(), TimeFrame::H4);
        assert_eq!("1D".parse::<TimeFrame>().unwrap(), TimeFrame::D1);
        assert_eq!("1w".parse::<TimeFrame>().unwrap(), TimeFrame::W1);
    }

    #[test]
    fn display_round_trips_codes() {
        for code in ["5m", "15m", "1h", "4h", "1d", "1w"] {
            assert_eq!(code.parse::<TimeFrame>().unwrap().to_string(), code);
        }
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            "".parse::<TimeFrame>(),
            Err(TimeFrameError::InvalidInput { .. })
        ));
        assert!(matches!(
            "0m".parse::<TimeFrame>(),
            Err(TimeFrameError::InvalidAmount { .. })
        ));
        assert!(matches!(
            "5x".parse::<TimeFrame>(),
            Err(TimeFrameError::InvalidInput { .. })
        ));
        assert!(matches!(
            "m".parse::<TimeFrame>(),
            Err(TimeFrameError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn rejects_intervals_outside_the_feed() {
        for code in ["30m", "2h", "3d", "2000000000d"] {
            assert!(
                matches!(
                    code.parse::<TimeFrame>(),
                    Err(TimeFrameError::InvalidInput { ref message }) if message.contains(code)
                ),
                "{code} should be rejected"
            );
        }
        let off_feed = TimeFrame::new(nz(30), TimeFrameUnit::Minute);
        assert!(!off_feed.is_supported());
        assert!(serde_json::from_str::<TimeFrame>("\"2w\"").is_err());
    }

    #[test]
    fn durations_match_interval_lengths() {
        assert_eq!(TimeFrame::M5.millis(), 5 * 60 * 1000);
        assert_eq!(TimeFrame::H4.millis(), 4 * 60 * 60 * 1000);
        assert_eq!(TimeFrame::W1.millis(), 7 * 24 * 60 * 60 * 1000);
    }

    #[test]
    fn derived_timeframes_map_to_stored_base() {
        assert_eq!(TimeFrame::M15.base_timeframe(), TimeFrame::M5);
        assert_eq!(TimeFrame::H4.base_timeframe(), TimeFrame::H1);
        assert_eq!(TimeFrame::D1.base_timeframe(), TimeFrame::H1);
        assert_eq!(TimeFrame::W1.base_timeframe(), TimeFrame::H1);
        assert!(TimeFrame::M5.is_base());
        assert!(TimeFrame::H1.is_base());
    }

    #[test]
    fn serializes_as_code() {
        let json = serde_json::to_string(&TimeFrame::H4).unwrap();
        assert_eq!(json, "\"4h\"");
        let back: TimeFrame = serde_json::from_str("\"15m\"").unwrap();
        assert_eq!(back, TimeFrame::M15);
    }
}
