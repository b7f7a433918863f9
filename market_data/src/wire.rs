//! Decoder for the exchange kline wire format.
//!
//! Klines arrive as JSON arrays of rows:
//!
//! ```text
//! [
//!   [1499040000000, "0.0163479", "0.8", "0.015758", "0.015771", "148976.11", 1499644799999, ...],
//!   ...
//! ]
//! ```
//!
//! Only the first six columns (open time in milliseconds, open, high, low,
//! close, volume) are used. Prices may be numeric strings or JSON numbers.

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::models::bar::{Bar, BarError};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed kline JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("row {row}: expected at least 6 columns, found {found}")]
    ShortRow { row: usize, found: usize },

    #[error("row {row}, column {column}: {message}")]
    Field {
        row: usize,
        column: usize,
        message: String,
    },

    #[error("row {row}: {source}")]
    InvalidBar {
        row: usize,
        #[source]
        source: BarError,
    },
}

/// Decodes a JSON document of kline rows into validated bars, keeping the
/// order of the input.
pub fn decode_klines(json: &str) -> Result<Vec<Bar>, WireError> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(json)?;
    rows.iter()
        .enumerate()
        .map(|(row, cols)| decode_row(row, cols))
        .collect()
}

fn decode_row(row: usize, cols: &[Value]) -> Result<Bar, WireError> {
    if cols.len() < 6 {
        return Err(WireError::ShortRow {
            row,
            found: cols.len(),
        });
    }

    let open_ms = integer_field(row, 0, &cols[0])?;
    let open_time = DateTime::<Utc>::from_timestamp_millis(open_ms).ok_or_else(|| {
        WireError::Field {
            row,
            column: 0,
            message: format!("timestamp {open_ms} out of range"),
        }
    })?;

    let open = decimal_field(row, 1, &cols[1])?;
    let high = decimal_field(row, 2, &cols[2])?;
    let low = decimal_field(row, 3, &cols[3])?;
    let close = decimal_field(row, 4, &cols[4])?;
    let volume = decimal_field(row, 5, &cols[5])?;

    Bar::new(open_time, open, high, low, close, volume)
        .map_err(|source| WireError::InvalidBar { row, source })
}

fn integer_field(row: usize, column: usize, value: &Value) -> Result<i64, WireError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| WireError::Field {
        row,
        column,
        message: format!("expected integer, got {value}"),
    })
}

fn decimal_field(row: usize, column: usize, value: &Value) -> Result<f64, WireError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| WireError::Field {
        row,
        column,
        message: format!("expected decimal, got {value}"),
    })
}
