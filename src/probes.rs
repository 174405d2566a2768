//! Probe metadata lookup
//!
//! Histogram and scalar definition documents map a probe name to its
//! definition. Only the description and the notification addresses matter
//! here; they are copied into each new ledger entry.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Metric names recorded during startup carry this prefix in the dumps but not
/// in the probe definitions.
pub const STARTUP_PREFIX: &str = "STARTUP_";

/// The parts of a probe definition the ledger needs
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProbeDefinition {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub alert_emails: Option<Vec<String>>,
    #[serde(default)]
    pub notification_emails: Option<Vec<String>>,
}

impl ProbeDefinition {
    /// Alert addresses, falling back to notification addresses
    pub fn emails(&self) -> Vec<String> {
        self.alert_emails
            .clone()
            .or_else(|| self.notification_emails.clone())
            .unwrap_or_default()
    }
}

/// Merged probe definitions
///
/// Scalar definitions override histogram definitions that share a name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeCatalog {
    probes: BTreeMap<String, ProbeDefinition>,
}

impl ProbeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge histogram and scalar definitions, scalars winning on collisions
    pub fn merged(
        histograms: BTreeMap<String, ProbeDefinition>,
        scalars: BTreeMap<String, ProbeDefinition>,
    ) -> Self {
        let mut probes = histograms;
        probes.extend(scalars);
        Self { probes }
    }

    /// Load both definition files
    ///
    /// A missing or malformed file contributes no definitions; regressions are
    /// still recorded, just without description or addresses.
    pub fn load(histograms_path: &Path, scalars_path: &Path) -> Self {
        Self::merged(
            load_definitions(histograms_path),
            load_definitions(scalars_path),
        )
    }

    pub fn insert(&mut self, name: impl Into<String>, definition: ProbeDefinition) {
        self.probes.insert(name.into(), definition);
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Definition for a metric, looking startup metrics up without their prefix
    pub fn lookup(&self, metric: &str) -> Option<&ProbeDefinition> {
        let name = metric.strip_prefix(STARTUP_PREFIX).unwrap_or(metric);
        self.probes.get(name)
    }
}

/// Parse a definitions document, skipping entries that are not definitions
pub fn parse_definitions(content: &str) -> serde_json::Result<BTreeMap<String, ProbeDefinition>> {
    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(content)?;

    Ok(raw
        .into_iter()
        .filter_map(|(name, value)| match serde_json::from_value(value) {
            Ok(definition) => Some((name, definition)),
            Err(e) => {
                tracing::debug!("Skipping probe definition {}: {}", name, e);
                None
            }
        })
        .collect())
}

fn load_definitions(path: &Path) -> BTreeMap<String, ProbeDefinition> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Cannot read probe definitions {}: {}", path.display(), e);
            return BTreeMap::new();
        }
    };

    match parse_definitions(&content) {
        Ok(definitions) => {
            tracing::debug!(
                "Loaded {} probe definitions from {}",
                definitions.len(),
                path.display()
            );
            definitions
        }
        Err(e) => {
            tracing::warn!("Invalid probe definitions {}: {}", path.display(), e);
            BTreeMap::new()
        }
    }
}
