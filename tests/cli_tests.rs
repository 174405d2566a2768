//! End-to-end tests of the histalert binary on synthetic dump trees
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

mod fixtures;

use fixtures::{dump, shift_dump, Workspace, BASELINE, SHIFTED};
use predicates::prelude::*;
use tempfile::TempDir;

fn histalert(ws: &Workspace) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("histalert");
    cmd.args(ws.args());
    cmd
}

#[test]
fn test_new_regression_is_reported_and_stored() {
    let dir = TempDir::new().unwrap();
    let ws = Workspace::new(dir.path());
    ws.add_metric("GC_MS.json", &shift_dump(10, 3));

    histalert(&ws)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Regression found for GC_MS, 2024-01-11 [new]",
        ));

    let ledger: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(ws.ledger_path()).unwrap()).unwrap();
    let entry = &ledger["2024-01-11"]["GC_MS"];
    assert_eq!(entry["description"], "Time spent in GC");
    assert_eq!(entry["alert_emails"][0], "perf@example.com");
    assert_eq!(entry["buckets"], serde_json::json!([0, 10, 100, 1000]));
    assert_eq!(entry["regression"][0], 7000.0);
    assert_eq!(entry["reference"][2], 4000.0);
}

#[test]
fn test_second_run_reports_known_regression_without_marker() {
    let dir = TempDir::new().unwrap();
    let ws = Workspace::new(dir.path());
    ws.add_metric("GC_MS.json", &shift_dump(10, 3));

    histalert(&ws).assert().success();
    histalert(&ws)
        .assert()
        .success()
        .stdout(predicate::str::contains("Regression found for GC_MS, 2024-01-11"))
        .stdout(predicate::str::contains("[new]").not());
}

#[test]
fn test_stable_metric_reports_nothing() {
    let dir = TempDir::new().unwrap();
    let ws = Workspace::new(dir.path());
    ws.add_metric("PAINT_MS.json", &dump(&[BASELINE; 20]));

    histalert(&ws)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    // the ledger is still written, empty
    let content = std::fs::read_to_string(ws.ledger_path()).unwrap();
    assert_eq!(content.trim(), "{}");
}

#[test]
fn test_one_day_blip_reports_nothing() {
    let dir = TempDir::new().unwrap();
    let ws = Workspace::new(dir.path());
    let mut days = vec![BASELINE; 10];
    days.push(SHIFTED);
    days.extend([BASELINE; 5]);
    ws.add_metric("GC_MS.json", &dump(&days));

    histalert(&ws)
        .assert()
        .success()
        .stdout(predicate::str::contains("Regression").not());
}

#[test]
fn test_scalar_definition_and_startup_prefix() {
    let dir = TempDir::new().unwrap();
    let ws = Workspace::new(dir.path());
    ws.add_metric("startup/STARTUP_PAINT_MS.json", &shift_dump(10, 3));

    histalert(&ws)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Regression found for STARTUP_PAINT_MS, 2024-01-11 [new]",
        ));

    let ledger: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(ws.ledger_path()).unwrap()).unwrap();
    let entry = &ledger["2024-01-11"]["STARTUP_PAINT_MS"];
    assert_eq!(entry["description"], "Paint time");
    assert_eq!(entry["alert_emails"][0], "gfx@example.com");
}

#[test]
fn test_bad_metric_is_skipped_with_warning() {
    let dir = TempDir::new().unwrap();
    let ws = Workspace::new(dir.path());
    ws.add_metric("GC_MS.json", &shift_dump(10, 3));
    ws.add_metric("NO_DATE.json", r#"[{"buckets": [0], "values": [1]}]"#);

    histalert(&ws)
        .assert()
        .success()
        .stdout(predicate::str::contains("GC_MS, 2024-01-11 [new]"))
        .stderr(predicate::str::contains("Missing date"));
}

#[test]
fn test_plots_are_written() {
    let dir = TempDir::new().unwrap();
    let ws = Workspace::new(dir.path());
    ws.add_metric("GC_MS.json", &shift_dump(10, 3));
    let plots = dir.path().join("plots");

    histalert(&ws)
        .arg("--plot")
        .arg("--plot-dir")
        .arg(&plots)
        .assert()
        .success();

    let svg = std::fs::read_to_string(plots.join("plot-GC_MS-11-01-2024.svg")).unwrap();
    assert!(svg.contains("GC_MS"));
}

#[test]
fn test_longer_lookahead_from_config_file() {
    let dir = TempDir::new().unwrap();
    let ws = Workspace::new(dir.path());
    ws.add_metric("GC_MS.json", &shift_dump(10, 3));
    let config = dir.path().join("histalert.toml");
    std::fs::write(&config, "[detector]\nlookahead_days = 3\n").unwrap();

    // three shifted days cannot confirm a four-day window
    histalert(&ws)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_missing_histogram_directory_fails() {
    let dir = TempDir::new().unwrap();
    let ws = Workspace::new(dir.path());
    std::fs::remove_dir(dir.path().join("histograms")).unwrap();

    histalert(&ws)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read directory"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let ws = Workspace::new(dir.path());
    let config = dir.path().join("histalert.toml");
    std::fs::write(&config, "[detector]\nreference_window_days = 0\n").unwrap();

    histalert(&ws)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("reference_window_days"));
}

#[test]
fn test_shape_mismatch_warning_names_dump_file() {
    let dir = TempDir::new().unwrap();
    let ws = Workspace::new(dir.path());
    ws.add_metric("nightly/GC_MS.json", &shift_dump(10, 3));
    ws.add_metric(
        "release/GC_MS.json",
        r#"[{"date": "2024-01-01", "values": [1, 2, 3, 4]}, {"date": "2024-01-01", "values": [1, 2]}]"#,
    );
    let release = dir.path().join("histograms").join("release").join("GC_MS.json");

    histalert(&ws)
        .assert()
        .success()
        .stderr(predicate::str::contains(format!(
            "Shape mismatch in {}",
            release.display()
        )));
}

#[test]
fn test_findings_are_printed_when_ledger_cannot_be_saved() {
    let dir = TempDir::new().unwrap();
    let ws = Workspace::new(dir.path());
    ws.add_metric("GC_MS.json", &shift_dump(10, 3));
    std::fs::create_dir_all(ws.ledger_path()).unwrap();

    histalert(&ws)
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "Regression found for GC_MS, 2024-01-11 [new]",
        ))
        .stderr(predicate::str::contains("Failed to store ledger"));
}
