use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn dbtflow(root: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("dbtflow").unwrap();
    cmd.env("DBTFLOW_QUIET", "1")
        .env_remove("RUST_LOG")
        .env_remove("OTEL_EXPORTER_OTLP_ENDPOINT")
        .arg("--root")
        .arg(root.path());
    cmd
}

#[test]
fn test_version_flag() {
    let mut cmd = Command::cargo_bin("dbtflow").unwrap();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(dbtflow::VERSION));
}

#[test]
fn test_flows_lists_every_flow() {
    let root = TempDir::new().unwrap();
    let assert = dbtflow(&root).arg("flows").assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    for name in ["hello", "dbt-demo", "tuva", "snowflake-demo", "tuva-snowflake"] {
        assert!(
            stdout.lines().any(|line| line.starts_with(name)),
            "missing {} in:\n{}",
            name,
            stdout
        );
    }
}

#[test]
fn test_hello_prints_and_records_run() {
    let root = TempDir::new().unwrap();
    dbtflow(&root)
        .arg("hello")
        .assert()
        .success()
        .stdout(predicate::str::contains("=== basic-test-flow ==="))
        .stdout(predicate::str::contains("Status: Completed"))
        .stdout(predicate::str::contains("result: Task completed"));

    let runs: Vec<_> = fs::read_dir(root.path().join(".dbtflow").join("runs"))
        .unwrap()
        .collect();
    assert_eq!(runs.len(), 1);
    assert!(root
        .path()
        .join(".dbtflow")
        .join("logs")
        .join("dbtflow.log")
        .exists());
}

#[test]
fn test_hello_json_output() {
    let root = TempDir::new().unwrap();
    let assert = dbtflow(&root)
        .args(["--format", "json", "hello"])
        .assert()
        .success();

    let record: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(record["flow"], "hello");
    assert_eq!(record["status"], "Completed");
    assert_eq!(record["result"]["result"], "Task completed");
}

#[test]
fn test_missing_connector_fails_with_tips() {
    let root = TempDir::new().unwrap();
    dbtflow(&root)
        .args(["snowflake-demo", "--connector", "ghost"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Status: Failed"))
        .stderr(predicate::str::contains("connector 'ghost' is not configured"))
        .stderr(predicate::str::contains("Troubleshooting tips:"));

    dbtflow(&root)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("snowflake-demo"))
        .stdout(predicate::str::contains("Failed"));
}

#[test]
fn test_history_newest_first_with_limit() {
    let root = TempDir::new().unwrap();
    dbtflow(&root).arg("hello").assert().success();
    dbtflow(&root)
        .args(["snowflake-demo", "--connector", "ghost"])
        .assert()
        .failure();

    let assert = dbtflow(&root)
        .args(["history", "--limit", "1"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.contains("snowflake-demo"));
}

#[test]
fn test_empty_history() {
    let root = TempDir::new().unwrap();
    dbtflow(&root)
        .arg("history")
        .assert()
        .success()
        .stdout("No runs recorded.\n");
}

#[test]
fn test_invalid_config_is_reported() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("dbtflow.toml"), "[retry]\nretries = 99\n").unwrap();
    dbtflow(&root)
        .arg("hello")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("retry.retries must be at most 10"));
}

#[test]
fn test_unknown_command_is_usage_error() {
    let mut cmd = Command::cargo_bin("dbtflow").unwrap();
    cmd.arg("airflow");
    cmd.assert().code(2);
}

#[test]
fn test_bad_logging_config_warns_and_still_runs() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join(".dbtflow").join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("logging.toml"), "[logging]\ndefault_level = \"=\"\n").unwrap();

    dbtflow(&root)
        .arg("hello")
        .assert()
        .success()
        .stdout(predicate::str::contains("Status: Completed"))
        .stderr(predicate::str::contains("[WARNING] logging disabled"))
        .stderr(predicate::str::contains("Context: logging.default_level"));
}
