//! Clips a moving-average line to the visible window without a leading gap.

use market_data::models::bar::Bar;

use crate::indicators::MaPoint;

/// Aligns `points` (sorted by time) to the time span of `bars`.
///
/// The line starts exactly at the first bar. Its opening value comes from the
/// latest point at or before that bar, or from the earliest point when the
/// warm-up ends inside the window. It is followed by every point after the
/// first bar up to and including the last one.
pub fn align(points: &[MaPoint], bars: &[Bar]) -> Vec<MaPoint> {
    let (Some(first_bar), Some(last_bar)) = (bars.first(), bars.last()) else {
        return Vec::new();
    };
    let Some(earliest) = points.first() else {
        return Vec::new();
    };
    let first = first_bar.open_time;
    let last = last_bar.open_time;

    let after_first = points.partition_point(|p| p.time <= first);
    let anchor = after_first
        .checked_sub(1)
        .map_or(earliest, |i| &points[i]);
    let until_last = points.partition_point(|p| p.time <= last);

    let mut out = Vec::with_capacity(1 + until_last.saturating_sub(after_first));
    out.push(MaPoint {
        time: first,
        value: anchor.value,
    });
    if after_first < until_last {
        out.extend_from_slice(&points[after_first..until_last]);
    }
    out
}
