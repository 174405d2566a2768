// Configuration for histogram regression detection
//
// Every constant of the windowed comparison lives here so callers (and the TOML
// run configuration) can tune it without touching the scanner.

use serde::{Deserialize, Serialize};

/// Configuration for windowed histogram regression detection
///
/// A day is flagged when it, and every day of its lookahead window, is far from
/// the trailing reference window by a consistent margin:
/// - distance to the most recent usable reference day above `distance_threshold`
/// - spread (population std-dev) of all reference distances at most `max_distance_spread`
/// - more than half of `reference_window_days` reference days carried enough data
///
/// # Example
/// ```
/// use histalert::regression::DetectorConfig;
///
/// let config = DetectorConfig::default();
/// assert_eq!(config.reference_window_days, 7);
/// assert_eq!(config.lookahead_days, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Number of trailing days forming the reference window
    ///
    /// Near the start of a series the window is clipped, but the "more than half"
    /// data-sufficiency rule is always measured against this nominal size.
    ///
    /// Default: 7
    pub reference_window_days: usize,

    /// Number of days after the candidate day that must also look anomalous
    ///
    /// A regression at day `i` needs days `i..=i + lookahead_days` to all be
    /// suspicious against the same reference window. 0 disables confirmation.
    ///
    /// Default: 2
    pub lookahead_days: usize,

    /// Minimum Bhattacharyya distance to the most recent reference day
    ///
    /// Default: 0.12
    pub distance_threshold: f64,

    /// Maximum population standard deviation of the reference distances
    ///
    /// A narrow spread means the test day differs from *every* reference day by
    /// about the same amount, rather than from one noisy outlier.
    ///
    /// Default: 0.01
    pub max_distance_spread: f64,

    /// Minimum total count a histogram needs to take part in a comparison
    ///
    /// Default: 1000
    pub min_total_count: f64,

    /// Minimum count of the largest bucket a histogram needs
    ///
    /// Default: 1000
    pub min_peak_count: f64,

    /// Histograms with this many buckets or more are never plotted
    ///
    /// Default: 300
    pub plot_bucket_limit: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            reference_window_days: 7,
            lookahead_days: 2,
            distance_threshold: 0.12,
            max_distance_spread: 0.01,
            min_total_count: 1000.0,
            min_peak_count: 1000.0,
            plot_bucket_limit: 300,
        }
    }
}

impl DetectorConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.reference_window_days == 0 {
            return Err("reference_window_days must be >= 1, got 0".to_string());
        }

        if !self.distance_threshold.is_finite() || self.distance_threshold < 0.0 {
            return Err(format!(
                "distance_threshold must be a non-negative number, got {}",
                self.distance_threshold
            ));
        }

        if !self.max_distance_spread.is_finite() || self.max_distance_spread < 0.0 {
            return Err(format!(
                "max_distance_spread must be a non-negative number, got {}",
                self.max_distance_spread
            ));
        }

        let limits = [self.min_total_count, self.min_peak_count];
        if limits.iter().any(|limit| !limit.is_finite() || *limit < 0.0) {
            return Err(format!(
                "sufficiency limits must be non-negative numbers, got total={} peak={}",
                self.min_total_count, self.min_peak_count
            ));
        }

        Ok(())
    }

    /// Number of retained reference days a comparison needs to be conclusive
    ///
    /// Strictly more than half of the nominal window: 4 for the default of 7.
    pub fn min_reference_days(&self) -> usize {
        self.reference_window_days / 2 + 1
    }
}
