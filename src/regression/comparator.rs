// Window comparator: one test day against a trailing reference window
//
// A day is "suspicious" when enough reference days carry data, the distance to
// the most recent usable reference day is large, and the distances to all
// usable reference days agree with each other (narrow spread).

use crate::regression::config::DetectorConfig;
use crate::regression::histogram::{distance, has_insufficient_data, is_degenerate, normalize};
use crate::series::DailyHistogram;

/// A pair of raw daily histograms judged to differ
#[derive(Debug, Clone, PartialEq)]
pub struct RepresentativePair {
    /// The day under test
    pub regression: DailyHistogram,
    /// The last reference day it was compared against
    pub reference: DailyHistogram,
}

/// Outcome of comparing one day against its reference window
#[derive(Debug, Clone, PartialEq)]
pub struct DayComparison {
    /// Distances to each retained reference day, in window order
    pub distances: Vec<f64>,
    /// Population standard deviation of `distances` (None when empty)
    pub spread: Option<f64>,
    /// Set when the day is suspicious
    pub candidate: Option<RepresentativePair>,
}

impl DayComparison {
    fn inconclusive() -> Self {
        Self {
            distances: Vec::new(),
            spread: None,
            candidate: None,
        }
    }

    pub fn is_suspicious(&self) -> bool {
        self.candidate.is_some()
    }
}

/// Compare day `idx` of a date-sorted series against the days in `reference`
///
/// Returns the (test day, last compared reference day) pair when the day is
/// suspicious, `None` otherwise. Reference days with insufficient raw data are
/// skipped; zero retained reference days is never suspicious.
///
/// # Panics
/// Panics if `idx` or any index in `reference` is out of bounds for `days`.
pub fn compare_day(
    days: &[DailyHistogram],
    idx: usize,
    reference: &[usize],
    config: &DetectorConfig,
) -> Option<RepresentativePair> {
    evaluate_day(days, idx, reference, config).candidate
}

/// Like [`compare_day`], but also reports the distances and their spread
pub fn evaluate_day(
    days: &[DailyHistogram],
    idx: usize,
    reference: &[usize],
    config: &DetectorConfig,
) -> DayComparison {
    let test_day = &days[idx];
    tracing::debug!("Comparing {}", test_day.date);

    let hist = normalize(&test_day.counts);
    if is_degenerate(&hist) {
        tracing::debug!("Histogram for {} is empty, cannot compare", test_day.date);
        return DayComparison::inconclusive();
    }

    let mut distances = Vec::with_capacity(reference.len());
    let mut last_compared = None;

    for &jdx in reference {
        let ref_day = &days[jdx];
        tracing::trace!("To {}", ref_day.date);

        if has_insufficient_data(&ref_day.counts, config) {
            tracing::debug!("Reference histogram {} has not enough data", ref_day.date);
            continue;
        }

        distances.push(distance(&hist, &normalize(&ref_day.counts)));
        last_compared = Some(ref_day);
    }

    let spread = population_std_dev(&distances);
    let latest = distances.last().copied();
    let (Some(latest), Some(spread_value), Some(ref_day)) = (latest, spread, last_compared) else {
        tracing::debug!("No reference day with enough data for {}", test_day.date);
        return DayComparison {
            distances,
            spread,
            candidate: None,
        };
    };

    tracing::debug!(
        "Bhattacharyya distance: {:.4}, spread: {:.4} ({} reference days)",
        latest,
        spread_value,
        distances.len()
    );

    let suspicious = distances.len() >= config.min_reference_days()
        && latest > config.distance_threshold
        && spread_value <= config.max_distance_spread;

    let candidate = if suspicious {
        tracing::debug!("Suspicious difference found on {}", test_day.date);
        Some(RepresentativePair {
            regression: test_day.clone(),
            reference: ref_day.clone(),
        })
    } else {
        None
    };

    DayComparison {
        distances,
        spread,
        candidate,
    }
}

/// Population standard deviation, `None` for an empty slice
///
/// Kept in f64: the result is compared against `max_distance_spread` directly.
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt())
}
