// Shared fixtures for integration tests: synthetic metric dumps on disk

use serde_json::json;
use std::path::{Path, PathBuf};

pub const BASELINE: [u64; 4] = [1000, 3000, 4000, 2000];
pub const SHIFTED: [u64; 4] = [7000, 1000, 1000, 1000];

/// One record per day for January 2024, day numbers starting at 1
pub fn dump(days: &[[u64; 4]]) -> String {
    let records: Vec<_> = days
        .iter()
        .enumerate()
        .map(|(i, values)| {
            json!({
                "date": format!("2024-01-{:02}T00:00:00.000Z", i + 1),
                "buckets": [0, 10, 100, 1000],
                "values": values,
            })
        })
        .collect();
    serde_json::to_string_pretty(&records).unwrap()
}

/// `baseline_days` baseline days then `shifted_days` shifted days
pub fn shift_dump(baseline_days: usize, shifted_days: usize) -> String {
    let mut days = vec![BASELINE; baseline_days];
    days.extend(vec![SHIFTED; shifted_days]);
    dump(&days)
}

/// Workspace with a histogram tree, probe definitions and a ledger location
pub struct Workspace {
    pub root: PathBuf,
}

impl Workspace {
    pub fn new(root: &Path) -> Self {
        std::fs::create_dir_all(root.join("histograms")).unwrap();
        std::fs::write(
            root.join("Histograms.json"),
            r#"{"GC_MS": {"description": "Time spent in GC", "alert_emails": ["perf@example.com"], "kind": "exponential"}}"#,
        )
        .unwrap();
        std::fs::write(
            root.join("Scalars.json"),
            r#"{"PAINT_MS": {"description": "Paint time", "notification_emails": ["gfx@example.com"]}}"#,
        )
        .unwrap();
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn add_metric(&self, relative: &str, content: &str) {
        let path = self.root.join("histograms").join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join("dashboard").join("regressions.json")
    }

    pub fn args(&self) -> Vec<String> {
        vec![
            "--histograms".to_string(),
            self.root.join("histograms").display().to_string(),
            "--ledger".to_string(),
            self.ledger_path().display().to_string(),
            "--histogram-definitions".to_string(),
            self.root.join("Histograms.json").display().to_string(),
            "--scalar-definitions".to_string(),
            self.root.join("Scalars.json").display().to_string(),
        ]
    }
}
