use chrono::{Duration, Utc};
use dbtflow::core::types::{ErrorCategory, FlowKind, RunStatus};
use dbtflow::core::{AppError, OutputFormat, ResultsProcessor, RunHistoryRecorder, RunRecord};
use std::fs;
use tempfile::TempDir;

fn run_started_minutes_ago(flow: FlowKind, minutes: i64) -> RunRecord {
    let mut run = RunRecord::start(flow);
    run.started_at = Utc::now() - Duration::minutes(minutes);
    run
}

#[test]
fn test_list_orders_newest_first() {
    let temp_dir = TempDir::new().unwrap();
    let recorder = RunHistoryRecorder::new(temp_dir.path().join("runs"));

    let mut oldest = run_started_minutes_ago(FlowKind::Tuva, 30);
    oldest.complete(serde_json::json!({"database_path": "/work/data/tuva_demo.duckdb"}));
    let mut middle = run_started_minutes_ago(FlowKind::SnowflakeDemo, 20);
    middle.fail(
        &AppError::new(ErrorCategory::ValidationError, "connector 'x' is not configured")
            .with_code("SF-001"),
    );
    let newest = run_started_minutes_ago(FlowKind::Hello, 10);

    for run in [&middle, &newest, &oldest] {
        recorder.record(run).unwrap();
    }

    let runs = recorder.list(None).unwrap();
    let flows: Vec<FlowKind> = runs.iter().map(|run| run.flow).collect();
    assert_eq!(
        flows,
        [FlowKind::Hello, FlowKind::SnowflakeDemo, FlowKind::Tuva]
    );
    assert_eq!(runs[1].status, RunStatus::Failed);
    assert_eq!(
        runs[1].error.as_deref(),
        Some("[SF-001] connector 'x' is not configured")
    );

    assert_eq!(recorder.list(Some(2)).unwrap().len(), 2);
}

#[test]
fn test_list_skips_unreadable_records() {
    let temp_dir = TempDir::new().unwrap();
    let runs_dir = temp_dir.path().join("runs");
    let recorder = RunHistoryRecorder::new(runs_dir.clone());

    let mut run = RunRecord::start(FlowKind::DbtDemo);
    run.complete(serde_json::json!({}));
    recorder.record(&run).unwrap();
    fs::write(runs_dir.join("garbage.json"), "{ not json").unwrap();
    fs::write(runs_dir.join("notes.txt"), "ignored").unwrap();

    let runs = recorder.list(None).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_id, run.run_id);
}

#[test]
fn test_missing_runs_dir_is_empty_history() {
    let temp_dir = TempDir::new().unwrap();
    let recorder = RunHistoryRecorder::new(temp_dir.path().join("never-created"));
    assert!(recorder.list(Some(5)).unwrap().is_empty());
}

#[test]
fn test_history_renders_as_json_array() {
    let mut run = RunRecord::start(FlowKind::TuvaSnowflake);
    run.complete(serde_json::json!({"project_directory": "/work/dbt/tuva_snowflake_demo"}));

    let rendered = ResultsProcessor::default()
        .render_history(std::slice::from_ref(&run), OutputFormat::Json)
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(parsed[0]["flow"], "tuva-snowflake");
    assert_eq!(parsed[0]["status"], "Completed");

    let text = ResultsProcessor::default()
        .render_history(&[run], OutputFormat::Text)
        .unwrap();
    assert!(text.contains("tuva-snowflake"));
    assert!(text.contains("Completed"));
}
