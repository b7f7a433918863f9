//! Symbols and timeframes the viewer offers.

use serde::Serialize;

use crate::models::timeframe::TimeFrame;

/// A selectable entry: machine value plus human-readable label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub value: String,
    pub label: String,
}

const SYMBOLS: [(&str, &str); 5] = [
    ("BTCUSDT", "BTC/USDT"),
    ("ETHUSDT", "ETH/USDT"),
    ("BNBUSDT", "BNB/USDT"),
    ("ADAUSDT", "ADA/USDT"),
    ("SOLUSDT", "SOL/USDT"),
];

const TIMEFRAMES: [(TimeFrame, &str); 6] = [
    (TimeFrame::M5, "5 minutes"),
    (TimeFrame::M15, "15 minutes"),
    (TimeFrame::H1, "1 hour"),
    (TimeFrame::H4, "4 hours"),
    (TimeFrame::D1, "1 day"),
    (TimeFrame::W1, "1 week"),
];

pub fn supported_symbols() -> Vec<CatalogEntry> {
    SYMBOLS
        .iter()
        .map(|(value, label)| CatalogEntry {
            value: (*value).to_string(),
            label: (*label).to_string(),
        })
        .collect()
}

pub fn supported_timeframes() -> Vec<CatalogEntry> {
    TIMEFRAMES
        .iter()
        .map(|(tf, label)| CatalogEntry {
            value: tf.to_string(),
            label: (*label).to_string(),
        })
        .collect()
}

pub fn is_supported_symbol(symbol: &str) -> bool {
    SYMBOLS.iter().any(|(value, _)| *value == symbol)
}

pub fn is_supported_timeframe(tf: TimeFrame) -> bool {
    TIMEFRAMES.iter().any(|(t, _)| *t == tf)
}
