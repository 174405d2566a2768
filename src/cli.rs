//! CLI argument parsing for histalert

use clap::Parser;
use std::path::PathBuf;

use crate::config::RunConfig;

#[derive(Parser, Debug)]
#[command(name = "histalert")]
#[command(version)]
#[command(about = "Detect sustained distribution shifts in daily telemetry histograms", long_about = None)]
pub struct Cli {
    /// TOML run configuration (flags below override its values)
    #[arg(short = 'C', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory tree of per-metric JSON dumps
    #[arg(long = "histograms", value_name = "DIR")]
    pub histograms_dir: Option<PathBuf>,

    /// Ledger of previously reported regressions
    #[arg(long = "ledger", value_name = "FILE")]
    pub ledger: Option<PathBuf>,

    /// Histogram probe definitions
    #[arg(long = "histogram-definitions", value_name = "FILE")]
    pub histogram_definitions: Option<PathBuf>,

    /// Scalar probe definitions
    #[arg(long = "scalar-definitions", value_name = "FILE")]
    pub scalar_definitions: Option<PathBuf>,

    /// Write an SVG comparison plot for every regression
    #[arg(long = "plot")]
    pub plot: bool,

    /// Directory for comparison plots
    #[arg(long = "plot-dir", value_name = "DIR")]
    pub plot_dir: Option<PathBuf>,

    /// Trailing reference window in days
    #[arg(long = "reference-days", value_name = "DAYS")]
    pub reference_days: Option<usize>,

    /// Following days that must confirm a regression
    #[arg(long = "lookahead-days", value_name = "DAYS")]
    pub lookahead_days: Option<usize>,

    /// Enable debug tracing output (one line per analyzed day)
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Overlay the flags that were given on top of `config`
    pub fn apply(&self, config: &mut RunConfig) {
        if let Some(dir) = &self.histograms_dir {
            config.histograms_dir = dir.clone();
        }
        if let Some(path) = &self.ledger {
            config.ledger_path = path.clone();
        }
        if let Some(path) = &self.histogram_definitions {
            config.histogram_definitions = path.clone();
        }
        if let Some(path) = &self.scalar_definitions {
            config.scalar_definitions = path.clone();
        }
        if self.plot {
            config.output_plots = true;
        }
        if let Some(dir) = &self.plot_dir {
            config.plot_dir = dir.clone();
        }
        if let Some(days) = self.reference_days {
            config.detector.reference_window_days = days;
        }
        if let Some(days) = self.lookahead_days {
            config.detector.lookahead_days = days;
        }
    }
}
