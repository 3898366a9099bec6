//! CLI integration tests

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn vrisk(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vrisk"))
        .args(args)
        .env("HOME", home)
        .env_remove("VRISK_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute vrisk")
}

/// Write 30 days of on-time delivery falling from 95 to 60
fn write_declining_history(dir: &Path, name: &str) -> PathBuf {
    let records: Vec<Value> = (0..30)
        .map(|i| {
            json!({
                "date": format!("2024-04-{:02}", i + 1),
                "on_time_delivery": 95.0 - 35.0 * i as f64 / 29.0,
            })
        })
        .collect();
    let path = dir.join(name);
    let doc = json!({ "vendor_id": "ACME", "records": records });
    std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();
    path
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let home = TempDir::new().unwrap();
    let output = vrisk(home.path(), &["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Vendor risk"), "Should show app description");
    assert!(stdout.contains("analyze"), "Should show analyze command");
    assert!(stdout.contains("forecast"), "Should show forecast command");
    assert!(stdout.contains("batch"), "Should show batch command");
    assert!(stdout.contains("--format"), "Should show format option");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let home = TempDir::new().unwrap();
    let output = vrisk(home.path(), &["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("vrisk"), "Should show binary name");
}

/// Test analyze with JSON output
#[test]
fn test_analyze_json() {
    let dir = TempDir::new().unwrap();
    let file = write_declining_history(dir.path(), "acme.json");
    let output = vrisk(
        dir.path(),
        &["analyze", file.to_str().unwrap(), "--horizon", "14", "--format", "json"],
    );

    assert!(output.status.success(), "Analyze should succeed: {}", String::from_utf8_lossy(&output.stderr));
    let analysis: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        analysis["metrics_analysis"]["on_time_delivery"]["trend"]["direction"],
        "decreasing"
    );
    assert_eq!(analysis["predictions"]["horizon_days"], 14);
    let categories: Vec<&str> = analysis["risk_findings"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["category"].as_str())
        .collect();
    assert!(categories.contains(&"performance_decline"));
}

/// Test analyze table output
#[test]
fn test_analyze_table() {
    let dir = TempDir::new().unwrap();
    let file = write_declining_history(dir.path(), "acme.json");
    let output = vrisk(dir.path(), &["analyze", file.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Vendor: ACME"));
    assert!(stdout.contains("on_time_delivery"));
    assert!(stdout.contains("performance_decline"));
}

/// Test explicit current metrics override the history
#[test]
fn test_analyze_with_current_file() {
    let dir = TempDir::new().unwrap();
    let file = write_declining_history(dir.path(), "acme.json");
    let current = dir.path().join("current.json");
    std::fs::write(&current, r#"{"financial_health_score": 20}"#).unwrap();

    let output = vrisk(
        dir.path(),
        &[
            "analyze",
            file.to_str().unwrap(),
            "--current",
            current.to_str().unwrap(),
            "--format",
            "json",
        ],
    );

    assert!(output.status.success());
    let analysis: Value = serde_json::from_slice(&output.stdout).unwrap();
    let financial = analysis["risk_findings"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["category"] == "financial_instability")
        .expect("financial finding");
    assert_eq!(financial["level"], "critical");
}

/// Test forecast with an explicit method
#[test]
fn test_forecast_naive() {
    let dir = TempDir::new().unwrap();
    let file = write_declining_history(dir.path(), "acme.json");
    let output = vrisk(
        dir.path(),
        &[
            "forecast",
            file.to_str().unwrap(),
            "--metric",
            "on_time_delivery",
            "--horizon",
            "5",
            "--method",
            "naive",
            "--format",
            "json",
        ],
    );

    assert!(output.status.success());
    let forecast: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(forecast["method"], "naive_linear");
    assert_eq!(forecast["values"].as_array().unwrap().len(), 5);
}

/// Test forecasting a metric that is not in the file
#[test]
fn test_forecast_unknown_metric() {
    let dir = TempDir::new().unwrap();
    let file = write_declining_history(dir.path(), "acme.json");
    let output = vrisk(
        dir.path(),
        &["forecast", file.to_str().unwrap(), "--metric", "missing"],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown metric"));
}

/// Test batch keeps going when one vendor fails
#[test]
fn test_batch_reports_failures() {
    let dir = TempDir::new().unwrap();
    let good = write_declining_history(dir.path(), "good.json");
    let short = dir.path().join("short.json");
    std::fs::write(&short, r#"[{"date": "2024-01-01", "quality_score": 90}]"#).unwrap();

    let output = vrisk(
        dir.path(),
        &["batch", good.to_str().unwrap(), short.to_str().unwrap(), "--format", "json"],
    );

    assert!(!output.status.success(), "Batch with a failing vendor should exit non-zero");
    let entries: Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["vendor"], "ACME");
    assert!(entries[0].get("analysis").is_some());
    assert!(entries[1]["error"].as_str().unwrap().contains("Insufficient data"));
}

/// Test batch honors the current block of each vendor file
#[test]
fn test_batch_uses_current_metrics() {
    let dir = TempDir::new().unwrap();
    let records: Vec<Value> = (0..12)
        .map(|i| json!({ "date": format!("2024-05-{:02}", i + 1), "on_time_delivery": 96.0 }))
        .collect();
    let file = dir.path().join("steady.json");
    let doc = json!({
        "vendor_id": "STEADY",
        "records": records,
        "current": { "on_time_delivery": 50.0 },
    });
    std::fs::write(&file, serde_json::to_string(&doc).unwrap()).unwrap();

    let single = vrisk(dir.path(), &["analyze", file.to_str().unwrap(), "--format", "json"]);
    let batch = vrisk(dir.path(), &["batch", file.to_str().unwrap(), "--format", "json"]);
    assert!(single.status.success());
    assert!(batch.status.success());

    let categories = |findings: &Value| -> Vec<String> {
        findings
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|f| f["category"].as_str().map(String::from))
            .collect()
    };
    let single: Value = serde_json::from_slice(&single.stdout).unwrap();
    let batch: Value = serde_json::from_slice(&batch.stdout).unwrap();
    let from_analyze = categories(&single["risk_findings"]);
    let from_batch = categories(&batch[0]["analysis"]["risk_findings"]);

    assert!(from_analyze.contains(&"performance_decline".to_string()));
    assert_eq!(from_analyze, from_batch);
}

/// Test config file from the command line
#[test]
fn test_config_file_applies() {
    let dir = TempDir::new().unwrap();
    let file = write_declining_history(dir.path(), "acme.json");
    let config = dir.path().join("vrisk.toml");
    std::fs::write(&config, "min_records = 40\n").unwrap();

    let output = vrisk(
        dir.path(),
        &["--config", config.to_str().unwrap(), "analyze", file.to_str().unwrap()],
    );

    assert!(!output.status.success(), "30 records are below the configured minimum");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("need 40"));
}

/// Test invalid command error handling
#[test]
fn test_invalid_command() {
    let home = TempDir::new().unwrap();
    let output = vrisk(home.path(), &["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error") || stderr.contains("invalid"),
        "Should show error message"
    );
}

/// Test missing required argument error handling
#[test]
fn test_missing_argument() {
    let home = TempDir::new().unwrap();
    let output = vrisk(home.path(), &["batch"]);

    assert!(!output.status.success(), "Missing argument should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("required") || stderr.contains("error"),
        "Should show error about missing argument"
    );
}
