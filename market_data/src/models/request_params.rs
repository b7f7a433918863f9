use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::timeframe::TimeFrame;

/// Parameters for requesting one symbol's bars from a market data provider.
///
/// It is intended as the standard input for all
/// [`DataProvider`](crate::providers::DataProvider) implementations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarsRequestParams {
    /// Exchange symbol to request (e.g. `"BTCUSDT"`).
    pub symbol: String,

    /// The time interval for each bar.
    pub timeframe: TimeFrame,

    /// Start of the requested time range (inclusive, UTC).
    ///
    /// Providers should return bars opening at or after this timestamp.
    pub start: DateTime<Utc>,

    /// End of the requested time range (exclusive, UTC).
    ///
    /// Providers should return bars opening strictly before this timestamp.
    pub end: DateTime<Utc>,
}

impl BarsRequestParams {
    /// True when `time` falls inside `[start, end)`.
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start <= time && time < self.end
    }
}
