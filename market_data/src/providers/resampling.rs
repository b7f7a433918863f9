//! Derived-timeframe provider.
//!
//! Only the base timeframes are stored at the source; coarser ones are
//! aggregated on the fly from their base (see
//! [`TimeFrame::base_timeframe`](crate::models::timeframe::TimeFrame::base_timeframe)).

use async_trait::async_trait;

use crate::{
    models::{bar_series::BarSeries, request_params::BarsRequestParams},
    providers::{DataProvider, ProviderError},
    resample::resample,
};

/// Wraps a provider of base timeframes and serves any timeframe.
#[derive(Debug, Clone)]
pub struct ResamplingProvider<P> {
    inner: P,
}

impl<P> ResamplingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: DataProvider> DataProvider for ResamplingProvider<P> {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<BarSeries, ProviderError> {
        let target = params.timeframe;
        let base = target.base_timeframe();
        if base == target {
            return self.inner.fetch_bars(params).await;
        }

        tracing::debug!(%target, %base, symbol = %params.symbol, "resampling from base timeframe");
        let base_series = self
            .inner
            .fetch_bars(BarsRequestParams {
                timeframe: base,
                ..params
            })
            .await?;

        let bars = resample(&base_series.bars, target);
        Ok(BarSeries::new(base_series.symbol, target, bars))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::{
        models::{bar::Bar, timeframe::TimeFrame},
        providers::memory::MemoryProvider,
    };

    fn hourly(n: usize) -> BarSeries {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = (0..n)
            .map(|i| {
                let p = 100.0 + i as f64;
                Bar::new(t0 + Duration::hours(i as i64), p, p + 1.0, p - 1.0, p, 1.0).unwrap()
            })
            .collect();
        BarSeries::new("BTCUSDT", TimeFrame::H1, bars)
    }

    fn request(tf: TimeFrame) -> BarsRequestParams {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        BarsRequestParams {
            symbol: "BTCUSDT".into(),
            timeframe: tf,
            start,
            end: start + Duration::days(2),
        }
    }

    #[tokio::test]
    async fn four_hour_bars_are_built_from_hourly() {
        let provider = ResamplingProvider::new(MemoryProvider::new().with_series(hourly(10)));
        let series = provider.fetch_bars(request(TimeFrame::H4)).await.unwrap();

        assert_eq!(series.timeframe, TimeFrame::H4);
        assert_eq!(series.len(), 3);
        assert_eq!(series.bars[0].open, 100.0);
        assert_eq!(series.bars[0].close, 103.0);
        assert_eq!(series.bars[0].volume, 4.0);
        assert_eq!(series.bars[2].volume, 2.0);
    }

    #[tokio::test]
    async fn base_timeframe_passes_through() {
        let provider = ResamplingProvider::new(MemoryProvider::new().with_series(hourly(5)));
        let series = provider.fetch_bars(request(TimeFrame::H1)).await.unwrap();
        assert_eq!(series.len(), 5);
    }

    #[tokio::test]
    async fn missing_base_is_unavailable() {
        let provider = ResamplingProvider::new(MemoryProvider::new());
        let err = provider.fetch_bars(request(TimeFrame::D1)).await.unwrap_err();
        assert!(matches!(err, ProviderError::DataUnavailable { .. }));
    }
}
