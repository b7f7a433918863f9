//! A collection of time-series bars for a specific symbol and timeframe.

use serde::{Deserialize, Serialize};

use crate::models::{bar::Bar, timeframe::TimeFrame};

/// Represents a complete set of time-series data for a single symbol.
///
/// This struct groups a vector of [`Bar`]s with their corresponding symbol
/// and [`TimeFrame`], making the data set self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    /// The symbol this data represents (e.g., "BTCUSDT").
    pub symbol: String,
    /// The time interval for each bar in the series.
    pub timeframe: TimeFrame,
    /// The collection of OHLCV bars, ascending by open time.
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, timeframe: TimeFrame, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Index of the first bar whose open time does not strictly follow its
    /// predecessor, if any.
    pub fn first_unordered_index(&self) -> Option<usize> {
        first_unordered_index(&self.bars)
    }
}

/// Returns the index of the first bar that breaks the strictly increasing
/// open-time order of `bars`.
pub fn first_unordered_index(bars: &[Bar]) -> Option<usize> {
    bars.windows(2)
        .position(|w| w[1].open_time <= w[0].open_time)
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bar_at(minute: i64) -> Bar {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute);
        Bar::new(t, 1.0, 1.0, 1.0, 1.0, 1.0).unwrap()
    }

    #[test]
    fn ordered_series_has_no_violation() {
        let s = BarSeries::new("BTCUSDT", TimeFrame::M5, vec![bar_at(0), bar_at(5), bar_at(10)]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.first_unordered_index(), None);
    }

    #[test]
    fn duplicate_open_time_is_reported() {
        let bars = vec![bar_at(0), bar_at(5), bar_at(5)];
        assert_eq!(first_unordered_index(&bars), Some(2));
    }

    #[test]
    fn descending_open_time_is_reported() {
        let bars = vec![bar_at(10), bar_at(5)];
        assert_eq!(first_unordered_index(&bars), Some(1));
    }
}
