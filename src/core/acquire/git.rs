#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::core::workspace::ensure_dir;
use crate::tools::{CommandExecutionRequest, CommandRunner};
use std::path::{Path, PathBuf};

/// Clone `repo_url` into `target` unless the directory is already there.
pub async fn clone_repository(
    runner: &dyn CommandRunner,
    git: &str,
    repo_url: &str,
    target: &Path,
) -> Result<PathBuf, AppError> {
    if target.exists() {
        tracing::info!(target_dir = %target.display(), "Repository exists, skipping clone");
        return Ok(target.to_path_buf());
    }

    if let Some(parent) = target.parent() {
        ensure_dir(parent)?;
    }

    tracing::info!("Cloning repository from {} to {}", repo_url, target.display());
    let request = CommandExecutionRequest::new(git)
        .arg("clone")
        .arg(repo_url)
        .arg(target.to_string_lossy());
    let output = runner.run(&request).await?;

    if !output.success() {
        let mut err = AppError::new(
            ErrorCategory::ToolExecutionError,
            format!("git clone of {} failed with exit code {}", repo_url, output.exit_code),
        )
        .with_code("GIT-001")
        .with_suggestion("Check the repository URL and your network access to it");
        err.add_context("command", &request.display());
        let tail = output.error_tail(20);
        if !tail.is_empty() {
            err.add_context("output", &tail);
        }
        return Err(err);
    }

    tracing::info!(target_dir = %target.display(), "Repository cloned");
    Ok(target.to_path_buf())
}
