//! In-memory provider, used for tests and pre-fetched data.

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::{
    models::{
        bar::Bar, bar_series::BarSeries, request_params::BarsRequestParams, timeframe::TimeFrame,
    },
    providers::{DataProvider, DataUnavailableSnafu, ProviderError, validate_params},
};

/// Serves bars from series registered up front, keyed by symbol and timeframe.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    series: IndexMap<(String, TimeFrame), Vec<Bar>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_series(mut self, series: BarSeries) -> Self {
        self.insert(series);
        self
    }

    /// Registers (or replaces) the bars of one symbol/timeframe pair.
    pub fn insert(&mut self, series: BarSeries) {
        let mut bars = series.bars;
        bars.sort_by_key(|b| b.open_time);
        bars.dedup_by_key(|b| b.open_time);
        self.series.insert((series.symbol, series.timeframe), bars);
    }
}

#[async_trait]
impl DataProvider for MemoryProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<BarSeries, ProviderError> {
        validate_params(&params)?;

        let key = (params.symbol.clone(), params.timeframe);
        let Some(all) = self.series.get(&key) else {
            return DataUnavailableSnafu {
                symbol: params.symbol,
                timeframe: params.timeframe,
                message: "symbol/timeframe not loaded",
            }
            .fail();
        };

        let bars = all
            .iter()
            .filter(|b| params.contains(b.open_time))
            .cloned()
            .collect();
        Ok(BarSeries::new(params.symbol, params.timeframe, bars))
    }
}
