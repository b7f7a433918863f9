//! Provider abstraction for market data sources.
//!
//! This module defines the [`DataProvider`] trait, a unified interface for
//! fetching one symbol's bars for a timeframe and half-open time range.
//! Network access and caching live behind implementations of this trait; the
//! player only ever sees a finished [`BarSeries`] or a [`ProviderError`].
//!
//! Bundled implementations:
//! - [`memory::MemoryProvider`] serves series held in memory.
//! - [`file::KlineFileProvider`] reads kline JSON exports from a directory.
//! - [`resampling::ResamplingProvider`] builds derived timeframes (`15m`,
//!   `4h`, `1d`, `1w`) from the stored base timeframe of another provider.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use market_data::models::{bar_series::BarSeries, request_params::BarsRequestParams};
//! use market_data::providers::{DataProvider, ProviderError};
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl DataProvider for MyProvider {
//!     async fn fetch_bars(
//!         &self,
//!         params: BarsRequestParams,
//!     ) -> Result<BarSeries, ProviderError> {
//!         Ok(BarSeries::new(params.symbol, params.timeframe, vec![]))
//!     }
//! }
//! ```

pub mod file;
pub mod memory;
pub mod resampling;

use std::path::PathBuf;

use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

use crate::{
    models::{bar_series::BarSeries, request_params::BarsRequestParams, timeframe::TimeFrame},
    wire::WireError,
};

/// Trait for fetching time-series bar data from a market data source.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetches the bars of `params.symbol` opening inside `[params.start, params.end)`.
    ///
    /// # Returns
    ///
    /// * `Ok(BarSeries)` - bars in ascending open-time order; may be empty.
    /// * `Err(ProviderError)` - the range cannot be served.
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<BarSeries, ProviderError>;
}

/// Errors that can occur within a `DataProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// The source has nothing for this symbol/timeframe.
    #[snafu(display("No data available for {symbol} {timeframe}: {message}"))]
    DataUnavailable {
        symbol: String,
        timeframe: TimeFrame,
        message: String,
        backtrace: Backtrace,
    },

    /// The request parameters were invalid for this provider.
    #[snafu(display("Invalid parameters for provider: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },

    /// Reading a backing file failed.
    #[snafu(display("Failed to read {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// A backing file is not valid kline JSON.
    #[snafu(display("Failed to decode {}: {source}", path.display()))]
    Decode {
        path: PathBuf,
        source: WireError,
        backtrace: Backtrace,
    },
}

/// Rejects empty or inverted ranges before any provider work happens.
pub(crate) fn validate_params(params: &BarsRequestParams) -> Result<(), ProviderError> {
    if params.symbol.trim().is_empty() {
        return ValidationSnafu {
            message: "symbol must not be empty",
        }
        .fail();
    }
    if params.start >= params.end {
        return ValidationSnafu {
            message: format!("start {} is not before end {}", params.start, params.end),
        }
        .fail();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::providers::memory::MemoryProvider;

    struct EmptyProvider;

    #[async_trait]
    impl DataProvider for EmptyProvider {
        async fn fetch_bars(&self, params: BarsRequestParams) -> Result<BarSeries, ProviderError> {
            validate_params(&params)?;
            Ok(BarSeries::new(params.symbol, params.timeframe, vec![]))
        }
    }

    // Selected at runtime, so it has to be a trait object.
    fn get_provider(name: &str) -> Box<dyn DataProvider> {
        if name == "memory" {
            Box::new(MemoryProvider::new())
        } else {
            Box::new(EmptyProvider)
        }
    }

    fn params() -> BarsRequestParams {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        BarsRequestParams {
            symbol: "BTCUSDT".to_string(),
            timeframe: TimeFrame::H1,
            start,
            end: start + Duration::days(1),
        }
    }

    #[tokio::test]
    async fn test_dynamic_provider() {
        let provider = get_provider("empty");
        let series = provider.fetch_bars(params()).await.unwrap();
        assert!(series.is_empty());
        assert_eq!(series.symbol, "BTCUSDT");
    }

    #[tokio::test]
    async fn inverted_range_is_a_validation_error() {
        let mut p = params();
        std::mem::swap(&mut p.start, &mut p.end);
        let err = get_provider("empty").fetch_bars(p).await.unwrap_err();
        assert!(matches!(err, ProviderError::Validation { .. }));
    }
}
