// Series regression scanner
//
// Slides a lookahead window over a date-sorted series. Day `i` is a regression
// when it and each of the following `lookahead_days` days are all suspicious
// against the reference window that ends just before `i`. A one-day blip never
// qualifies.

use chrono::NaiveDate;

use crate::regression::comparator::{compare_day, RepresentativePair};
use crate::regression::config::DetectorConfig;
use crate::regression::histogram::has_insufficient_data;
use crate::series::{BucketLabels, DailySeries, MetricSeries, SeriesError};

/// A sustained distribution shift found in one metric
#[derive(Debug, Clone, PartialEq)]
pub struct Regression {
    /// First day of the shift
    pub date: NaiveDate,
    /// Metric the shift was found in
    pub metric: String,
    /// Bucket labels of the metric
    pub buckets: BucketLabels,
    /// Earliest confirming (test day, reference day) pair
    pub pair: RepresentativePair,
}

/// Scan one metric's series for sustained regressions
///
/// Pure function of its inputs: no I/O, no shared state. The returned list is
/// in chronological order.
///
/// # Example
/// ```
/// use histalert::regression::{scan, DetectorConfig};
/// use histalert::series::DailySeries;
///
/// let series = DailySeries::new();
/// let found = scan(&series, "GC_MS", &[], &DetectorConfig::default());
/// assert!(found.is_empty());
/// ```
pub fn scan(
    series: &DailySeries,
    metric: &str,
    buckets: &[serde_json::Value],
    config: &DetectorConfig,
) -> Vec<Regression> {
    let days = series.to_days();
    let mut regressions = Vec::new();

    // The last `lookahead_days` days cannot be confirmed yet
    let scannable = days.len().saturating_sub(config.lookahead_days);

    for (i, day) in days.iter().enumerate().take(scannable) {
        tracing::debug!("Analyzing {} for {}", day.date, metric);

        if has_insufficient_data(&day.counts, config) {
            tracing::debug!("Histogram has not enough data");
            continue;
        }

        let reference: Vec<usize> = (i.saturating_sub(config.reference_window_days)..i).collect();
        let confirm_end = (i + config.lookahead_days + 1).min(days.len());

        // Some(..) only when every day of the lookahead window is suspicious
        let confirmations: Option<Vec<RepresentativePair>> = (i..confirm_end)
            .map(|j| compare_day(&days, j, &reference, config))
            .collect();

        let Some(pair) = confirmations.and_then(|pairs| pairs.into_iter().next()) else {
            continue;
        };

        tracing::info!("Regression found for {}, {}", metric, day.date);
        regressions.push(Regression {
            date: day.date,
            metric: metric.to_string(),
            buckets: buckets.to_vec(),
            pair,
        });
    }

    regressions
}

/// Validate a metric series and scan it
///
/// A bucket-count mismatch between any two days is reported before any
/// comparison is attempted; the metric then contributes no regressions.
pub fn detect(
    metric: &MetricSeries,
    config: &DetectorConfig,
) -> Result<Vec<Regression>, SeriesError> {
    metric.validate()?;
    Ok(scan(&metric.series, &metric.name, &metric.buckets, config))
}
