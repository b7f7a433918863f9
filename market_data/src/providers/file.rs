//! Provider backed by kline JSON exports on disk.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use snafu::ResultExt;

use crate::{
    models::{bar_series::BarSeries, request_params::BarsRequestParams, timeframe::TimeFrame},
    providers::{
        DataProvider, DataUnavailableSnafu, DecodeSnafu, IoSnafu, ProviderError, validate_params,
    },
    wire::decode_klines,
};

/// Reads `<dir>/<SYMBOL>_<timeframe>.json` files in the kline wire format
/// (see [`crate::wire`]).
#[derive(Debug, Clone)]
pub struct KlineFileProvider {
    dir: PathBuf,
}

impl KlineFileProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the export holding `symbol` at `timeframe`.
    pub fn path_for(&self, symbol: &str, timeframe: TimeFrame) -> PathBuf {
        self.dir.join(file_name(symbol, timeframe))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

pub fn file_name(symbol: &str, timeframe: TimeFrame) -> String {
    format!("{}_{}.json", symbol.to_uppercase(), timeframe)
}

#[async_trait]
impl DataProvider for KlineFileProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<BarSeries, ProviderError> {
        validate_params(&params)?;

        let path = self.path_for(&params.symbol, params.timeframe);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return DataUnavailableSnafu {
                    symbol: params.symbol,
                    timeframe: params.timeframe,
                    message: format!("no export at {}", path.display()),
                }
                .fail();
            }
            Err(e) => return Err(e).context(IoSnafu { path }),
        };

        let mut bars = decode_klines(&text).context(DecodeSnafu { path: path.clone() })?;

        let decoded = bars.len();
        bars.sort_by_key(|b| b.open_time);
        bars.dedup_by_key(|b| b.open_time);
        if bars.len() != decoded {
            tracing::warn!(
                path = %path.display(),
                dropped = decoded - bars.len(),
                "duplicate open times in kline export"
            );
        }

        bars.retain(|b| params.contains(b.open_time));
        tracing::debug!(
            symbol = %params.symbol,
            timeframe = %params.timeframe,
            bars = bars.len(),
            "loaded klines from file"
        );
        Ok(BarSeries::new(params.symbol, params.timeframe, bars))
    }
}
