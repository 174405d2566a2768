//! Persisted ledger of reported regressions
//!
//! The ledger maps an ISO day to the metrics that regressed on it:
//!
//! ```json
//! {
//!     "2024-03-11": {
//!         "GC_MS": {
//!             "buckets": [0, 1, 2],
//!             "regression": [7000, 1000, 1000],
//!             "reference": [1000, 3000, 4000],
//!             "description": "Time spent in GC",
//!             "alert_emails": ["perf@example.com"]
//!         }
//!     }
//! }
//! ```
//!
//! Entries are only ever added. A regression already present for its day and
//! metric is reported again, but not marked new and not rewritten.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::probes::ProbeCatalog;
use crate::regression::Regression;
use crate::series::BucketLabels;

/// Errors that can occur reading or writing the ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid ledger format: {0}")]
    InvalidFormat(#[from] serde_json::Error),
}

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Everything stored about one reported regression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionDescriptor {
    pub buckets: BucketLabels,
    /// Raw counts of the first confirming day
    pub regression: Vec<f64>,
    /// Raw counts of the reference day it was compared against
    pub reference: Vec<f64>,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_emails")]
    pub alert_emails: Vec<String>,
}

impl RegressionDescriptor {
    pub fn new(regression: &Regression, probes: &ProbeCatalog) -> Self {
        let probe = probes.lookup(&regression.metric);
        Self {
            buckets: regression.buckets.clone(),
            regression: regression.pair.regression.counts.clone(),
            reference: regression.pair.reference.counts.clone(),
            description: probe.map(|p| p.description.clone()).unwrap_or_default(),
            alert_emails: probe.map(|p| p.emails()).unwrap_or_default(),
        }
    }
}

/// Older ledgers store an empty string when a probe had no addresses
fn deserialize_emails<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Emails {
        List(Vec<String>),
        Single(String),
    }

    Ok(match Emails::deserialize(deserializer)? {
        Emails::List(list) => list,
        Emails::Single(s) if s.is_empty() => Vec::new(),
        Emails::Single(s) => vec![s],
    })
}

/// One line of the run report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub date: String,
    pub metric: String,
    pub is_new: bool,
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Regression found for {}, {}", self.metric, self.date)?;
        if self.is_new {
            write!(f, " [new]")?;
        }
        Ok(())
    }
}

/// Day → metric → descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegressionLedger {
    entries: BTreeMap<String, BTreeMap<String, RegressionDescriptor>>,
}

impl RegressionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a ledger file
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| LedgerError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Read a ledger file, treating a missing or unreadable file as empty
    pub fn load_or_default(path: &Path) -> Self {
        match Self::read(path) {
            Ok(ledger) => ledger,
            Err(LedgerError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::info!("No ledger at {}, starting a new one", path.display());
                Self::new()
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable ledger {}: {}", path.display(), e);
                Self::new()
            }
        }
    }

    /// Write the whole ledger, pretty printed with 4-space indentation
    pub fn save(&self, path: &Path) -> Result<()> {
        let io_error = |source: std::io::Error| LedgerError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;

        std::fs::write(path, buf).map_err(io_error)
    }

    pub fn contains(&self, date: &str, metric: &str) -> bool {
        self.entries
            .get(date)
            .is_some_and(|metrics| metrics.contains_key(metric))
    }

    pub fn get(&self, date: &str, metric: &str) -> Option<&RegressionDescriptor> {
        self.entries.get(date)?.get(metric)
    }

    /// Number of recorded (day, metric) entries
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record a regression unless its day and metric are already present
    ///
    /// Returns true when the entry was added.
    pub fn record(&mut self, regression: &Regression, probes: &ProbeCatalog) -> bool {
        let date = iso_day(regression);
        if self.contains(&date, &regression.metric) {
            return false;
        }

        self.entries
            .entry(date)
            .or_default()
            .insert(
                regression.metric.clone(),
                RegressionDescriptor::new(regression, probes),
            );
        true
    }

    /// Record every regression in date order and build the report
    pub fn apply(&mut self, regressions: &[Regression], probes: &ProbeCatalog) -> Vec<ReportLine> {
        let mut ordered: Vec<&Regression> = regressions.iter().collect();
        ordered.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.metric.cmp(&b.metric)));

        ordered
            .into_iter()
            .map(|regression| ReportLine {
                date: iso_day(regression),
                metric: regression.metric.clone(),
                is_new: self.record(regression, probes),
            })
            .collect()
    }
}

fn iso_day(regression: &Regression) -> String {
    regression.date.format("%Y-%m-%d").to_string()
}
