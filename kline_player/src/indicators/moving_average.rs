//! SMA / EMA / VWMA over bar closes.
//!
//! All three kinds share the same windowing: the first output point belongs
//! to `bars[period - 1]`, so equal periods yield equal timestamps (VWMA may
//! omit zero-volume windows). Insufficient data is an empty result, never an
//! error.

use std::fmt;

use chrono::{DateTime, Utc};
use market_data::models::bar::Bar;
use serde::{Deserialize, Serialize};

use crate::error::PlayerError;

pub const MIN_PERIOD: u16 = 1;
pub const MAX_PERIOD: u16 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaKind {
    Sma,
    Ema,
    Vwma,
}

impl fmt::Display for MaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MaKind::Sma => "SMA",
            MaKind::Ema => "EMA",
            MaKind::Vwma => "VWMA",
        })
    }
}

/// A validated moving-average configuration: kind plus a period in `1..=200`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MovingAverageSpec {
    kind: MaKind,
    period: u16,
}

impl MovingAverageSpec {
    pub fn new(kind: MaKind, period: u16) -> Result<Self, PlayerError> {
        if !(MIN_PERIOD..=MAX_PERIOD).contains(&period) {
            return Err(PlayerError::InvalidPeriod(period));
        }
        Ok(Self { kind, period })
    }

    pub fn kind(&self) -> MaKind {
        self.kind
    }

    pub fn period(&self) -> u16 {
        self.period
    }
}

impl fmt::Display for MovingAverageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.period)
    }
}

/// One sample of a moving-average line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MaPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// Computes `kind` with `period` over `bars`.
pub fn compute(bars: &[Bar], kind: MaKind, period: usize) -> Vec<MaPoint> {
    if period == 0 || bars.len() < period {
        return Vec::new();
    }
    match kind {
        MaKind::Sma => sma(bars, period),
        MaKind::Ema => ema(bars, period),
        MaKind::Vwma => vwma(bars, period),
    }
}

pub fn compute_spec(bars: &[Bar], spec: &MovingAverageSpec) -> Vec<MaPoint> {
    compute(bars, spec.kind, usize::from(spec.period))
}

fn mean_close(window: &[Bar]) -> f64 {
    window.iter().map(|b| b.close).sum::<f64>() / window.len() as f64
}

fn sma(bars: &[Bar], period: usize) -> Vec<MaPoint> {
    bars.windows(period)
        .map(|w| MaPoint {
            time: w[period - 1].open_time,
            value: mean_close(w),
        })
        .collect()
}

fn ema(bars: &[Bar], period: usize) -> Vec<MaPoint> {
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(bars.len() - period + 1);

    let mut prev = mean_close(&bars[..period]);
    out.push(MaPoint {
        time: bars[period - 1].open_time,
        value: prev,
    });
    for bar in &bars[period..] {
        prev = bar.close * k + prev * (1.0 - k);
        out.push(MaPoint {
            time: bar.open_time,
            value: prev,
        });
    }
    out
}

fn vwma(bars: &[Bar], period: usize) -> Vec<MaPoint> {
    bars.windows(period)
        .filter_map(|w| {
            let volume: f64 = w.iter().map(|b| b.volume).sum();
            if volume == 0.0 {
                return None;
            }
            let weighted: f64 = w.iter().map(|b| b.close * b.volume).sum();
            Some(MaPoint {
                time: w[period - 1].open_time,
                value: weighted / volume,
            })
        })
        .collect()
}
