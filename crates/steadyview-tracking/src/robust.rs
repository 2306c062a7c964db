//! Robust statistics for turning many local estimates into one global one.

/// Default rejection multiple, in units of the scaled MAD.
pub const DEFAULT_OUTLIER_THRESHOLD: f32 = 3.0;

/// Scale factor making the MAD a consistent estimator of the standard
/// deviation for normally distributed data.
const MAD_SCALE: f32 = 1.4826;

/// Lower bound on the spread, in pixels. Block offsets are integers, so a
/// perfectly agreeing set has a MAD of zero and would otherwise reject
/// values one pixel from the median.
const MIN_SPREAD: f32 = 0.5;

fn sorted(values: &[f32]) -> Vec<f32> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

fn median_of_sorted(sorted: &[f32]) -> f32 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) * 0.5
    }
}

/// Median of a set of values; 0 for an empty set.
pub fn median(values: &[f32]) -> f32 {
    median_of_sorted(&sorted(values))
}

/// Median absolute deviation from the median.
pub fn median_absolute_deviation(values: &[f32]) -> f32 {
    let m = median(values);
    let deviations: Vec<f32> = values.iter().map(|v| (v - m).abs()).collect();
    median(&deviations)
}

/// Remove values further than [`DEFAULT_OUTLIER_THRESHOLD`] scaled MADs from
/// the median. Fewer than 3 values are returned unchanged.
pub fn filter_outliers(values: &[f32]) -> Vec<f32> {
    filter_outliers_with(values, DEFAULT_OUTLIER_THRESHOLD)
}

/// Like [`filter_outliers`] with an explicit rejection multiple.
///
/// Input order is preserved. With `threshold >= 1` the result is never empty
/// for a non-empty input, since at least half the values lie within one MAD
/// of the median.
pub fn filter_outliers_with(values: &[f32], threshold: f32) -> Vec<f32> {
    if values.len() < 3 {
        return values.to_vec();
    }
    let m = median(values);
    let spread = (median_absolute_deviation(values) * MAD_SCALE).max(MIN_SPREAD);
    let limit = threshold * spread;
    values
        .iter()
        .copied()
        .filter(|v| (v - m).abs() <= limit)
        .collect()
}
