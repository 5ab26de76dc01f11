#![allow(clippy::result_large_err)]

use super::{CommandExecutionOutput, CommandExecutionRequest, CommandRunner};
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

/// Spawns real child processes with captured output.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(
        &self,
        request: &CommandExecutionRequest,
    ) -> Result<CommandExecutionOutput, AppError> {
        if request.program.trim().is_empty() {
            return Err(
                AppError::new(ErrorCategory::ValidationError, "program is empty")
                    .with_code("CMD-003"),
            );
        }

        let mut command = Command::new(&request.program);
        command
            .args(&request.args)
            .envs(&request.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &request.cwd {
            command.current_dir(cwd);
        }

        tracing::debug!(command = %request.display(), "spawning process");
        let start = Instant::now();

        let pending = command.output();
        let output = match request.timeout {
            Some(limit) => tokio::time::timeout(limit, pending).await.map_err(|_| {
                let mut err = AppError::new(
                    ErrorCategory::TimeoutError,
                    format!(
                        "command timed out after {}",
                        humantime::format_duration(limit)
                    ),
                )
                .with_code("CMD-002");
                err.add_context("command", &request.display());
                err
            })?,
            None => pending.await,
        }
        .map_err(|err| spawn_error(request, err))?;

        Ok(CommandExecutionOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code().unwrap_or(-1),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

fn spawn_error(request: &CommandExecutionRequest, err: std::io::Error) -> AppError {
    let mut app_err = AppError::new(
        ErrorCategory::ToolExecutionError,
        format!("failed to execute {}: {}", request.program, err),
    )
    .with_code("CMD-001");
    app_err.add_context("command", &request.display());
    if err.kind() == ErrorKind::NotFound {
        app_err = app_err.with_suggestion(format!(
            "Ensure {} is installed and on PATH, or set its executable in dbtflow.toml",
            request.program
        ));
    }
    app_err
}
