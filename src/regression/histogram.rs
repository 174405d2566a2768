// Histogram primitives for regression detection
//
// - sufficiency gate: sparse histograms make distances meaningless
// - normalization to a probability distribution
// - Bhattacharyya distance between two normalized histograms
//
// Sums and maxima go through trueno::Vector in f32. Counts are only compared
// against the sufficiency limits, where f32 rounding does not move the result.

use trueno::Vector;

use crate::regression::config::DetectorConfig;

/// Total of all bucket counts
pub fn total(hist: &[f64]) -> f64 {
    if hist.is_empty() {
        return 0.0;
    }
    let counts: Vec<f32> = hist.iter().map(|&c| c as f32).collect();
    Vector::from_slice(&counts).sum().unwrap_or(0.0) as f64
}

/// Largest single bucket count
pub fn peak(hist: &[f64]) -> f64 {
    if hist.is_empty() {
        return 0.0;
    }
    let counts: Vec<f32> = hist.iter().map(|&c| c as f32).collect();
    Vector::from_slice(&counts).max().unwrap_or(0.0) as f64
}

/// Check whether a raw histogram is too sparse to compare
///
/// True when the total count is below `min_total_count` OR the largest bucket is
/// below `min_peak_count`. Both clauses apply independently: 1200 submissions
/// spread evenly over twelve buckets are still insufficient.
///
/// # Example
/// ```
/// use histalert::regression::{has_insufficient_data, DetectorConfig};
///
/// let config = DetectorConfig::default();
/// assert!(has_insufficient_data(&[100.0; 12], &config));
/// assert!(!has_insufficient_data(&[1000.0, 200.0], &config));
/// ```
pub fn has_insufficient_data(hist: &[f64], config: &DetectorConfig) -> bool {
    total(hist) < config.min_total_count || peak(hist) < config.min_peak_count
}

/// Scale a histogram so its entries sum to 1
///
/// An all-zero histogram is returned unchanged (still all-zero) instead of
/// dividing by zero.
pub fn normalize(hist: &[f64]) -> Vec<f64> {
    let sum: f64 = hist.iter().sum();
    if sum == 0.0 {
        return hist.to_vec();
    }
    hist.iter().map(|&c| c / sum).collect()
}

/// True when a normalized histogram carries no mass at all
pub fn is_degenerate(normalized: &[f64]) -> bool {
    normalized.iter().all(|&p| p == 0.0)
}

/// Bhattacharyya distance between two normalized histograms
///
/// `-ln(Σ sqrt(hᵢ·refᵢ))`. 0 for identical distributions, growing with
/// divergence. The coefficient is clamped to `[f64::MIN_POSITIVE, 1]` so the
/// result is finite and never negative from rounding. Buckets past the shorter
/// input are ignored.
pub fn distance(hist: &[f64], reference: &[f64]) -> f64 {
    let coefficient: f64 = hist
        .iter()
        .zip(reference)
        .map(|(&h, &r)| (h * r).max(0.0).sqrt())
        .sum();

    -coefficient.clamp(f64::MIN_POSITIVE, 1.0).ln()
}
