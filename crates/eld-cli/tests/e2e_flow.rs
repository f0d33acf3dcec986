//! End-to-end integration tests for the duty logbook flow.
//!
//! Tests the full pipeline: init → duty changes → log/status → export.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn eld_binary() -> String {
    env!("CARGO_BIN_EXE_eld").to_string()
}

/// Run `eld` with its directories redirected into the temp dir.
fn eld(temp: &Path, args: &[&str]) -> Output {
    Command::new(eld_binary())
        .env("HOME", temp)
        .env("XDG_DATA_HOME", temp.join("data"))
        .env("XDG_CONFIG_HOME", temp.join("config"))
        .env("XDG_STATE_HOME", temp.join("state"))
        .args(args)
        .output()
        .expect("failed to run eld")
}

fn assert_success(output: &Output, context: &str) {
    assert!(
        output.status.success(),
        "{context} should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Initialize driver identity. Required before any recording command.
fn init_driver(temp: &Path) {
    let output = eld(temp, &["init", "--driver", "driver-1", "--label", "Alex"]);
    assert_success(&output, "eld init");
}

#[test]
fn test_init_writes_identity() {
    let temp = TempDir::new().unwrap();
    init_driver(temp.path());

    let identity_path = temp.path().join("data/eld/driver.json");
    assert!(identity_path.exists(), "driver.json should be created");
    let content = std::fs::read_to_string(&identity_path).unwrap();
    assert!(content.contains("driver-1"));
    assert!(content.contains("Alex"));
}

#[test]
fn test_recording_requires_identity() {
    let temp = TempDir::new().unwrap();

    let output = eld(temp.path(), &["duty", "off-duty"]);
    assert!(
        !output.status.success(),
        "duty without identity should fail"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("eld init"), "error should point at init");
}

#[test]
fn test_duty_changes_build_a_timeline() {
    let temp = TempDir::new().unwrap();
    init_driver(temp.path());

    // First change seeds the timeline.
    let output = eld(
        temp.path(),
        &["duty", "off-duty", "--location", "Home terminal"],
    );
    assert_success(&output, "first duty change");

    // Second change merges into the same slot or starts the next one.
    let output = eld(
        temp.path(),
        &["duty", "driving", "--odometer", "1200.5", "--engine-hours", "88.2"],
    );
    assert_success(&output, "second duty change");

    let output = eld(temp.path(), &["log", "--json"]);
    assert_success(&output, "eld log");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let timeline: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let events = timeline.as_array().unwrap();

    assert!(!events.is_empty() && events.len() <= 2);
    let last = events.last().unwrap();
    assert_eq!(last["status"], "driving");
    assert_eq!(last["origin"], "driver");
    assert_eq!(last["odometer"], 1200.5);
}

#[test]
fn test_status_shows_current_duty() {
    let temp = TempDir::new().unwrap();
    init_driver(temp.path());

    let output = eld(temp.path(), &["duty", "sleeping"]);
    assert_success(&output, "duty change");

    let output = eld(temp.path(), &["status"]);
    assert_success(&output, "eld status");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Driver: Alex (driver-1)"));
    assert!(stdout.contains("Current status: sleeping"));
}

#[test]
fn test_export_drains_the_outbox() {
    let temp = TempDir::new().unwrap();
    init_driver(temp.path());

    let output = eld(temp.path(), &["duty", "on-duty"]);
    assert_success(&output, "duty change");

    let output = eld(temp.path(), &["export"]);
    assert_success(&output, "first export");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.lines().any(|line| line.contains("\"op\":\"upsert\"")),
        "export should emit the queued upsert: {stdout}"
    );

    // Everything was drained; a second export is empty.
    let output = eld(temp.path(), &["export"]);
    assert_success(&output, "second export");
    assert!(output.stdout.is_empty());
}

#[test]
fn test_log_without_events_prints_a_note() {
    let temp = TempDir::new().unwrap();
    init_driver(temp.path());

    let output = eld(temp.path(), &["log"]);
    assert_success(&output, "eld log");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No duty events recorded."));
}
