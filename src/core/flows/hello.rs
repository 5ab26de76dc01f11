#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::task::{run_task, TaskPolicy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloResult {
    pub result: String,
}

/// Smoke test: one task, no external tools.
pub async fn basic_test_flow() -> Result<HelloResult, AppError> {
    tracing::info!("Starting basic test flow...");
    let result = run_task("hello_task", TaskPolicy::once(), || async {
        tracing::info!("Hello from the task!");
        Ok("Task completed".to_string())
    })
    .await?;
    tracing::info!("Result: {}", result);
    tracing::info!("Flow completed successfully!");
    Ok(HelloResult { result })
}
