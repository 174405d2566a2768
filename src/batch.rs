//! Batch run over a directory of metric dumps
//!
//! Each metric is loaded, validated and scanned on its own; a broken dump only
//! loses that metric. Per-metric results are concatenated into one list owned
//! by the run, then plotted, diffed against the ledger and persisted.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::RunConfig;
use crate::ledger::{RegressionLedger, ReportLine};
use crate::plot::plot_regression;
use crate::probes::ProbeCatalog;
use crate::regression::{detect, DetectorConfig, Regression};
use crate::series::{load_metric_file, SeriesError};

/// Counters for one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Metric dumps found
    pub files_scanned: usize,
    /// Nested directories or entries below the dump root that could not be read
    pub unreadable_paths: usize,
    /// Metrics abandoned because of unreadable or inconsistent data
    pub metrics_skipped: usize,
    /// Regressions found in this run, known or new
    pub regressions: usize,
    /// Regressions not present in the ledger before this run
    pub new_regressions: usize,
    /// Plots written
    pub plots_written: usize,
}

/// Outcome of a batch run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: RunSummary,
    /// One line per regression, in date order
    pub lines: Vec<ReportLine>,
}

/// Detection results with the updated ledger, not yet persisted
#[derive(Debug, Clone)]
pub struct Analysis {
    pub report: RunReport,
    ledger: RegressionLedger,
}

impl Analysis {
    pub fn ledger(&self) -> &RegressionLedger {
        &self.ledger
    }

    /// Store the updated ledger at `path`
    pub fn save_ledger(&self, path: &Path) -> Result<()> {
        self.ledger
            .save(path)
            .with_context(|| format!("Failed to store ledger {}", path.display()))
    }
}

/// Metric dumps found below a directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricFiles {
    /// `*.json` files in sorted path order
    pub files: Vec<PathBuf>,
    /// Nested directories or entries that could not be read
    pub unreadable: usize,
}

impl MetricFiles {
    fn add_entries(&mut self, dir: &Path, entries: std::fs::ReadDir, pending: &mut Vec<PathBuf>) {
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping entry in {}: {}", dir.display(), e);
                    self.unreadable += 1;
                    continue;
                }
            };

            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", entry.path().display(), e);
                    self.unreadable += 1;
                    continue;
                }
            };

            let path = entry.path();
            // symlinked directories are listed but never descended into
            if file_type.is_dir() {
                pending.push(path);
            } else if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                self.files.push(path);
            }
        }
    }
}

/// All `*.json` files below `dir`, without following directory symlinks
///
/// Failing to read `dir` itself is an error. Nested directories that cannot be
/// read are logged, counted and skipped.
pub fn collect_metric_files(dir: &Path) -> Result<MetricFiles> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;

    let mut found = MetricFiles::default();
    let mut pending = Vec::new();
    found.add_entries(dir, entries, &mut pending);

    while let Some(current) = pending.pop() {
        match std::fs::read_dir(&current) {
            Ok(entries) => found.add_entries(&current, entries, &mut pending),
            Err(e) => {
                tracing::warn!("Skipping directory {}: {}", current.display(), e);
                found.unreadable += 1;
            }
        }
    }

    found.files.sort();
    Ok(found)
}

/// Load, validate and scan one metric dump
pub fn process_file(path: &Path, config: &DetectorConfig) -> Result<Vec<Regression>, SeriesError> {
    tracing::debug!("Processing {}", path.display());
    let metric = load_metric_file(path)?;
    detect(&metric, config)
}

/// Scan every file, returning all regressions and the number of skipped metrics
pub fn detect_all(files: &[PathBuf], config: &DetectorConfig) -> (Vec<Regression>, usize) {
    let mut skipped = 0;
    let regressions = files
        .iter()
        .filter_map(|path| match process_file(path, config) {
            Ok(found) => Some(found),
            Err(e) => {
                tracing::warn!("Ignoring {}: {}", path.display(), e);
                skipped += 1;
                None
            }
        })
        .flatten()
        .collect();

    (regressions, skipped)
}

/// Number of buckets a regression is plotted with: its labels, else its values
fn bucket_count(regression: &Regression) -> usize {
    if regression.buckets.is_empty() {
        regression.pair.regression.counts.len()
    } else {
        regression.buckets.len()
    }
}

/// Write plots for regressions with fewer than `bucket_limit` buckets
///
/// Failures are logged and never propagated.
pub fn plot_all(regressions: &[Regression], dir: &Path, bucket_limit: usize) -> usize {
    let mut written = 0;

    for regression in regressions {
        // very wide histograms produce unusable images
        if bucket_count(regression) >= bucket_limit {
            continue;
        }

        match plot_regression(regression, dir) {
            Ok(path) => {
                tracing::debug!("Wrote {}", path.display());
                written += 1;
            }
            Err(e) => {
                tracing::warn!(
                    "Plot for {} on {} failed: {}",
                    regression.metric,
                    regression.date,
                    e
                );
            }
        }
    }

    written
}

/// Detect, plot and diff against the ledger, leaving the ledger unsaved
pub fn analyze(config: &RunConfig) -> Result<Analysis> {
    config.validate()?;

    let probes = ProbeCatalog::load(&config.histogram_definitions, &config.scalar_definitions);
    tracing::info!("Loaded {} probe definitions", probes.len());

    let found = collect_metric_files(&config.histograms_dir)?;
    tracing::info!(
        "Scanning {} metric dumps in {}",
        found.files.len(),
        config.histograms_dir.display()
    );

    let (regressions, metrics_skipped) = detect_all(&found.files, &config.detector);

    let plots_written = if config.output_plots {
        plot_all(
            &regressions,
            &config.plot_dir,
            config.detector.plot_bucket_limit,
        )
    } else {
        0
    };

    let mut ledger = RegressionLedger::load_or_default(&config.ledger_path);
    let lines = ledger.apply(&regressions, &probes);

    let summary = RunSummary {
        files_scanned: found.files.len(),
        unreadable_paths: found.unreadable,
        metrics_skipped,
        regressions: lines.len(),
        new_regressions: lines.iter().filter(|l| l.is_new).count(),
        plots_written,
    };
    tracing::info!("{:?}", summary);

    Ok(Analysis {
        report: RunReport { summary, lines },
        ledger,
    })
}

/// Run the whole pipeline described by `config`, including the ledger update
pub fn run(config: &RunConfig) -> Result<RunReport> {
    let analysis = analyze(config)?;
    analysis.save_ledger(&config.ledger_path)?;
    Ok(analysis.report)
}
