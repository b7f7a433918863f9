//! Aggregation of fine-grained bars into a coarser timeframe.

use chrono::{DateTime, Utc};

use crate::models::{bar::Bar, timeframe::TimeFrame};

/// Aggregates ascending `bars` into `target` buckets.
///
/// Buckets are aligned to the Unix epoch (`floor(open_ms / target_ms) * target_ms`),
/// so weekly buckets start on Thursdays. For each non-empty bucket the open is
/// the first bar's open, the close is the last bar's close, high/low are the
/// extremes and volume is the sum. Empty buckets produce no bar.
pub fn resample(bars: &[Bar], target: TimeFrame) -> Vec<Bar> {
    let step = target.millis();
    let mut out: Vec<Bar> = Vec::new();
    let mut current_key: Option<i64> = None;

    for bar in bars {
        let key = bar.open_time_ms().div_euclid(step) * step;
        if current_key == Some(key) {
            if let Some(acc) = out.last_mut() {
                acc.high = acc.high.max(bar.high);
                acc.low = acc.low.min(bar.low);
                acc.close = bar.close;
                acc.volume += bar.volume;
                continue;
            }
        }

        let Some(open_time) = DateTime::<Utc>::from_timestamp_millis(key) else {
            tracing::warn!(key, "bucket start out of range, skipping bar");
            continue;
        };
        out.push(Bar {
            open_time,
            ..bar.clone()
        });
        current_key = Some(key);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn five_minute_bars(closes: &[f64]) -> Vec<Bar> {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Bar::new(
                    t0 + Duration::minutes(5 * i as i64),
                    c,
                    c + 1.0,
                    c - 1.0,
                    c,
                    10.0,
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn fifteen_minute_buckets_combine_three_bars() {
        let bars = five_minute_bars(&[10.0, 12.0, 11.0, 20.0, 21.0]);
        let out = resample(&bars, TimeFrame::M15);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].open_time, bars[0].open_time);
        assert_eq!(out[0].open, 10.0);
        assert_eq!(out[0].close, 11.0);
        assert_eq!(out[0].high, 13.0);
        assert_eq!(out[0].low, 9.0);
        assert_eq!(out[0].volume, 30.0);

        // partial trailing bucket
        assert_eq!(out[1].open_time, bars[3].open_time);
        assert_eq!(out[1].close, 21.0);
        assert_eq!(out[1].volume, 20.0);
    }

    #[test]
    fn bucket_start_is_aligned_even_if_first_bar_is_not() {
        let mut bars = five_minute_bars(&[10.0, 11.0]);
        // shift so the series starts mid-bucket (00:05)
        for b in &mut bars {
            b.open_time += Duration::minutes(5);
        }
        let out = resample(&bars, TimeFrame::M15);
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0].open_time,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(resample(&[], TimeFrame::H4).is_empty());
    }
}
