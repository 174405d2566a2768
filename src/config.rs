//! Run configuration
//!
//! Where to find the metric dumps, probe definitions and ledger, whether to
//! plot, and the detector thresholds. Everything has a default matching the
//! dashboard layout, so an empty (or absent) TOML file is a valid config:
//!
//! ```toml
//! histograms_dir = "histograms"
//! ledger_path = "dashboard/regressions.json"
//! output_plots = true
//!
//! [detector]
//! lookahead_days = 3
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::regression::DetectorConfig;

/// Configuration for one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Directory tree of per-metric JSON dumps
    #[serde(default = "default_histograms_dir")]
    pub histograms_dir: PathBuf,

    /// Ledger of previously reported regressions
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,

    /// Histogram probe definitions
    #[serde(default = "default_histogram_definitions")]
    pub histogram_definitions: PathBuf,

    /// Scalar probe definitions (override histogram definitions)
    #[serde(default = "default_scalar_definitions")]
    pub scalar_definitions: PathBuf,

    /// Write a comparison plot per regression
    pub output_plots: bool,

    /// Directory for comparison plots
    #[serde(default = "default_plot_dir")]
    pub plot_dir: PathBuf,

    /// Detection thresholds
    pub detector: DetectorConfig,
}

fn default_histograms_dir() -> PathBuf {
    PathBuf::from("histograms")
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("dashboard/regressions.json")
}

fn default_histogram_definitions() -> PathBuf {
    PathBuf::from("Histograms.json")
}

fn default_scalar_definitions() -> PathBuf {
    PathBuf::from("Scalars.json")
}

fn default_plot_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            histograms_dir: default_histograms_dir(),
            ledger_path: default_ledger_path(),
            histogram_definitions: default_histogram_definitions(),
            scalar_definitions: default_scalar_definitions(),
            output_plots: false,
            plot_dir: default_plot_dir(),
            detector: DetectorConfig::default(),
        }
    }
}

impl RunConfig {
    /// Parse a TOML configuration
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid run configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("In {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        self.detector.validate().map_err(|e| anyhow::anyhow!(e))
    }
}
