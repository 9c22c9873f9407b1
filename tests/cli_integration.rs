//! End-to-end runs of the `re100-agg` binary.

mod common;

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use re100_agg::io::export::export_readings_csv;
use serde_json::Value;

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_re100-agg"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("re100-agg process should run")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp path should be UTF-8")
}

fn read_json(path: &Path) -> Value {
    let text = fs::read_to_string(path).expect("output file should exist");
    serde_json::from_str(&text).expect("output should be JSON")
}

#[test]
fn sample_run_writes_snapshot_and_series() {
    let dir = tempfile::tempdir().expect("tempdir");
    let snap_path = dir.path().join("snapshot.json");
    let csv_path = dir.path().join("series.csv");

    let output = run_cli(&[
        "--sample",
        "--seed",
        "7",
        "--check",
        "--out",
        path_str(&snap_path),
        "--series-csv",
        path_str(&csv_path),
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("--- Coverage Summary ---"));
    assert!(stdout.contains("Consistency: ok"));

    let snapshot = read_json(&snap_path);
    assert!(snapshot["monthly"]["solar"]["total"]["2024-01"].is_f64());
    assert!(snapshot["hourly_profile"]["demand"]["compA"]["12"].is_f64());
    let rate = snapshot["coverage_rate"]["2024-01"]
        .as_f64()
        .expect("coverage for January");
    assert!((0.0..=100.0).contains(&rate));

    let series = fs::read_to_string(&csv_path).expect("series csv");
    assert!(series.starts_with("view,group,series,bucket,value"));
    assert!(series.lines().count() > 100);
}

#[test]
fn csv_input_and_rename_of_saved_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("readings.csv");
    let rows = vec![
        common::reading("2024-03-01 10:00", "solar", "plantA", 100.0),
        common::reading("2024-03-02 10:00", "solar", "plantB", 50.0),
        common::reading("2024-03-01 10:00", "demand", "compA", 200.0),
    ];
    export_readings_csv(&rows, &input).expect("write readings");

    let snap_path = dir.path().join("snapshot.json");
    let output = run_cli(&["--input", path_str(&input), "--out", path_str(&snap_path)]);
    assert!(output.status.success());
    let snapshot = read_json(&snap_path);
    assert_eq!(snapshot["monthly"]["solar"]["total"]["2024-03"], 150.0);
    assert_eq!(snapshot["coverage_rate"]["2024-03"], 75.0);

    let names = dir.path().join("names.toml");
    fs::write(&names, "plantA = \"Onshore Solar\"\n").expect("write rename table");
    let renamed_path = dir.path().join("renamed.json");
    let output = run_cli(&[
        "--snapshot-in",
        path_str(&snap_path),
        "--rename",
        path_str(&names),
        "--out",
        path_str(&renamed_path),
    ]);
    assert!(output.status.success());

    let renamed = read_json(&renamed_path);
    let solar = &renamed["monthly"]["solar"];
    assert_eq!(solar["Onshore Solar"]["2024-03"], 100.0);
    assert!(solar.get("plantA").is_none());
    assert_eq!(solar["total"], snapshot["monthly"]["solar"]["total"]);
}

#[test]
fn saved_snapshot_takes_display_names_from_preset() {
    let dir = tempfile::tempdir().expect("tempdir");
    let snap_path = dir.path().join("snapshot.json");
    let output = run_cli(&["--sample", "--out", path_str(&snap_path)]);
    assert!(output.status.success());

    let names = dir.path().join("names.toml");
    fs::write(&names, "wind_plant1 = \"Gunsan\"\n").expect("write rename table");
    let renamed_path = dir.path().join("renamed.json");
    let output = run_cli(&[
        "--snapshot-in",
        path_str(&snap_path),
        "--preset",
        "sample",
        "--rename",
        path_str(&names),
        "--out",
        path_str(&renamed_path),
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let original = read_json(&snap_path);
    let renamed = read_json(&renamed_path);
    assert_eq!(
        renamed["monthly"]["solar"]["Onshore Solar"],
        original["monthly"]["solar"]["solar_plant1"]
    );
    assert_eq!(
        renamed["monthly"]["wind"]["Gunsan"],
        original["monthly"]["wind"]["wind_plant1"]
    );
    assert!(renamed["monthly"]["wind"].get("Gunsan Offshore Wind").is_none());
    assert_eq!(renamed["coverage_rate"], original["coverage_rate"]);
}

#[test]
fn bad_arguments_exit_with_usage() {
    let output = run_cli(&["--sample", "--input", "x.csv"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("mutually exclusive"));
    assert!(stderr.contains("Usage:"));
}

#[test]
fn missing_input_file_is_reported() {
    let output = run_cli(&["--input", "/nonexistent/readings.csv"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}
