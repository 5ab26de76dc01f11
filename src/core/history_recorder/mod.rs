#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::types::{ErrorCategory, FlowKind, RunStatus};
use crate::utils::serialization::{FileSerializer, FileUtils, JsonSerializer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

/// One flow run as persisted under `.dbtflow/runs/<run_id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub flow: FlowKind,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunRecord {
    pub fn start(flow: FlowKind) -> Self {
        RunRecord {
            run_id: Uuid::new_v4(),
            flow,
            status: RunStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            result: None,
            error: None,
        }
    }

    pub fn complete(&mut self, result: serde_json::Value) {
        self.status = RunStatus::Completed;
        self.finished_at = Some(Utc::now());
        self.result = Some(result);
    }

    pub fn fail(&mut self, error: &AppError) {
        self.status = RunStatus::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(format!("[{}] {}", error.code, error.message));
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at
            .map(|finished| finished.signed_duration_since(self.started_at))
    }
}

pub struct RunHistoryRecorder {
    runs_dir: PathBuf,
    serializer: JsonSerializer,
}

impl RunHistoryRecorder {
    pub fn new(runs_dir: PathBuf) -> Self {
        RunHistoryRecorder {
            runs_dir,
            serializer: JsonSerializer::pretty(),
        }
    }

    fn record_path(&self, run_id: Uuid) -> PathBuf {
        self.runs_dir.join(format!("{}.json", run_id))
    }

    pub fn record(&self, run: &RunRecord) -> Result<PathBuf, AppError> {
        let path = self.record_path(run.run_id);
        FileUtils
            .save_to_file(&path, run, &self.serializer)
            .map_err(|mut e| {
                e.add_context("run_id", &run.run_id.to_string());
                e.with_code("HISTORY-001")
            })?;
        tracing::debug!(run_id = %run.run_id, path = %path.display(), "run recorded");
        Ok(path)
    }

    /// Recorded runs, newest first. Unreadable files are skipped.
    pub fn list(&self, limit: Option<usize>) -> Result<Vec<RunRecord>, AppError> {
        if !self.runs_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.runs_dir).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("failed to read {}: {}", self.runs_dir.display(), e),
            )
            .with_code("HISTORY-003")
        })?;

        let mut runs: Vec<RunRecord> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| {
                match FileUtils.load_from_file::<RunRecord, _>(&path, &self.serializer) {
                    Ok(run) => Some(run),
                    Err(err) => {
                        tracing::warn!(path = %path.display(), "skipping run record: {}", err.message);
                        None
                    }
                }
            })
            .collect();

        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        if let Some(limit) = limit {
            runs.truncate(limit);
        }
        Ok(runs)
    }
}
