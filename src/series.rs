//! Daily histogram series for one metric
//!
//! A metric dump is a JSON list of per-submission records:
//!
//! ```json
//! [
//!   {"date": "2024-03-01T00:00:00", "buckets": [0, 1, 2], "values": [10, 40, 3]},
//!   {"date": "2024-03-01T12:00:00", "buckets": [0, 1, 2], "values": [12, 38, 5]}
//! ]
//! ```
//!
//! Records sharing a calendar day are summed bucket-by-bucket into one
//! [`DailyHistogram`]. The resulting [`MetricSeries`] is what the regression
//! scanner consumes; nothing in [`crate::regression`] touches the filesystem.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Bucket counts for one day, one entry per bucket
pub type Histogram = Vec<f64>;

/// Bucket labels exactly as they appear in the dump (numbers or strings)
pub type BucketLabels = Vec<serde_json::Value>;

/// Errors that abandon a metric for the current run
#[derive(Error, Debug)]
pub enum SeriesError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid metric dump {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing date in record {index} of {metric}")]
    MissingDate { metric: String, index: usize },

    #[error("Invalid date {value:?} in record {index} of {metric}")]
    InvalidDate {
        metric: String,
        index: usize,
        value: String,
    },

    #[error(
        "Bucket count mismatch in {metric}: {reference_date} has {expected} buckets, \
         while {date} has {found} buckets"
    )]
    BucketCountMismatch {
        metric: String,
        reference_date: NaiveDate,
        expected: usize,
        date: NaiveDate,
        found: usize,
    },

    #[error("Bucket labels disagree in {metric}: record {index} differs from earlier records")]
    BucketLabelMismatch { metric: String, index: usize },
}

/// One raw submission record from a metric dump
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub date: Option<String>,
    pub values: Vec<f64>,
    #[serde(default)]
    pub buckets: Option<BucketLabels>,
}

/// Histogram for one calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DailyHistogram {
    pub date: NaiveDate,
    pub counts: Histogram,
}

/// Date-keyed histograms; iteration is always chronological
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySeries {
    days: BTreeMap<NaiveDate, Histogram>,
}

impl DailySeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the histogram for `date`, replacing any previous value
    pub fn insert(&mut self, date: NaiveDate, counts: Histogram) {
        self.days.insert(date, counts);
    }

    /// Add `counts` element-wise into the histogram for `date`
    ///
    /// Returns `Err((existing_len, new_len))` without modifying anything when
    /// the shapes differ.
    pub fn accumulate(&mut self, date: NaiveDate, counts: &[f64]) -> Result<(), (usize, usize)> {
        match self.days.entry(date) {
            Entry::Vacant(slot) => {
                slot.insert(counts.to_vec());
                Ok(())
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                if existing.len() != counts.len() {
                    return Err((existing.len(), counts.len()));
                }
                for (acc, c) in existing.iter_mut().zip(counts) {
                    *acc += c;
                }
                Ok(())
            }
        }
    }

    pub fn get(&self, date: &NaiveDate) -> Option<&Histogram> {
        self.days.get(date)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Days in chronological order
    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &Histogram)> {
        self.days.iter()
    }

    /// Owned, chronologically sorted copy of the series
    pub fn to_days(&self) -> Vec<DailyHistogram> {
        self.days
            .iter()
            .map(|(date, counts)| DailyHistogram {
                date: *date,
                counts: counts.clone(),
            })
            .collect()
    }
}

impl FromIterator<(NaiveDate, Histogram)> for DailySeries {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, Histogram)>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}

/// Everything known about one metric for a run
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    pub name: String,
    pub buckets: BucketLabels,
    pub series: DailySeries,
}

impl MetricSeries {
    pub fn new(name: impl Into<String>, buckets: BucketLabels, series: DailySeries) -> Self {
        Self {
            name: name.into(),
            buckets,
            series,
        }
    }

    /// Aggregate raw records into one histogram per calendar day
    ///
    /// Same-day records with a different number of values than the running
    /// histogram are skipped with a warning. Records must agree on bucket labels
    /// when they carry them. The bucket counts across days are NOT checked here,
    /// see [`MetricSeries::validate`].
    pub fn from_records(name: &str, records: &[RawRecord]) -> Result<Self, SeriesError> {
        Self::aggregate(name, name, records)
    }

    /// Like [`MetricSeries::from_records`], with warnings naming `origin`
    /// (usually the dump file) instead of the metric
    fn aggregate(name: &str, origin: &str, records: &[RawRecord]) -> Result<Self, SeriesError> {
        let mut series = DailySeries::new();
        let mut buckets: Option<&BucketLabels> = None;

        for (index, record) in records.iter().enumerate() {
            let date = parse_day(name, index, record.date.as_deref())?;

            if let Err((expected, found)) = series.accumulate(date, &record.values) {
                tracing::warn!(
                    "Shape mismatch in {}: record {} for {} has {} values, cannot be added to {}",
                    origin,
                    index,
                    date,
                    found,
                    expected
                );
                continue;
            }

            if let Some(labels) = &record.buckets {
                match buckets {
                    Some(known) if known != labels => {
                        return Err(SeriesError::BucketLabelMismatch {
                            metric: name.to_string(),
                            index,
                        });
                    }
                    Some(_) => {}
                    None => buckets = Some(labels),
                }
            }
        }

        Ok(Self::new(name, buckets.cloned().unwrap_or_default(), series))
    }

    /// Check that every day has as many buckets as the earliest day
    pub fn validate(&self) -> Result<(), SeriesError> {
        let mut days = self.series.iter();
        let Some((reference_date, first)) = days.next() else {
            return Ok(());
        };

        for (date, hist) in days {
            if hist.len() != first.len() {
                return Err(SeriesError::BucketCountMismatch {
                    metric: self.name.clone(),
                    reference_date: *reference_date,
                    expected: first.len(),
                    date: *date,
                    found: hist.len(),
                });
            }
        }

        Ok(())
    }
}

/// Parse the calendar day from the first 10 characters of a record date
fn parse_day(metric: &str, index: usize, raw: Option<&str>) -> Result<NaiveDate, SeriesError> {
    let raw = raw.ok_or_else(|| SeriesError::MissingDate {
        metric: metric.to_string(),
        index,
    })?;

    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| SeriesError::InvalidDate {
        metric: metric.to_string(),
        index,
        value: raw.to_string(),
    })
}

/// Metric name for a dump file: the file name without its extension
pub fn metric_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Read and aggregate one metric dump file
pub fn load_metric_file(path: &Path) -> Result<MetricSeries, SeriesError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| SeriesError::Io {
        path: display.clone(),
        source,
    })?;
    let records: Vec<RawRecord> =
        serde_json::from_str(&content).map_err(|source| SeriesError::Json {
            path: display.clone(),
            source,
        })?;

    MetricSeries::aggregate(&metric_name(path), &display, &records)
}
