#![allow(clippy::result_large_err)]

pub mod profiles;
pub mod project;

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::tools::{CommandExecutionRequest, CommandRunner};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use profiles::{write_profiles, DuckDbTarget, Profile, SnowflakeTarget, Target};
pub use project::rewrite_project_profile;

const ERROR_TAIL_LINES: usize = 20;

/// Where and how dbt is invoked for one project.
#[derive(Debug, Clone)]
pub struct DbtSettings {
    pub executable: String,
    pub project_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub fail_on_error: bool,
    pub timeout: Option<Duration>,
}

/// Outcome of one dbt subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbtInvocation {
    pub command: String,
    pub success: bool,
    pub exit_code: i32,
    pub duration_ms: u64,
}

pub struct DbtRunner<'a> {
    runner: &'a dyn CommandRunner,
    settings: DbtSettings,
}

impl<'a> DbtRunner<'a> {
    pub fn new(runner: &'a dyn CommandRunner, settings: DbtSettings) -> Self {
        DbtRunner { runner, settings }
    }

    /// `dbt <command...> --project-dir <p> --profiles-dir <q>`, run from the
    /// project directory.
    pub fn build_request(&self, command: &str) -> Result<CommandExecutionRequest, AppError> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        if parts.is_empty() {
            return Err(
                AppError::new(ErrorCategory::ValidationError, "dbt command is empty")
                    .with_code("DBT-002"),
            );
        }

        Ok(CommandExecutionRequest::new(&self.settings.executable)
            .args(parts)
            .arg("--project-dir")
            .arg(self.settings.project_dir.to_string_lossy())
            .arg("--profiles-dir")
            .arg(self.settings.profiles_dir.to_string_lossy())
            .cwd(&self.settings.project_dir)
            .timeout(self.settings.timeout))
    }

    pub async fn invoke(&self, command: &str) -> Result<DbtInvocation, AppError> {
        let request = self.build_request(command)?;
        tracing::info!(command = %request.display(), "running dbt {}", command);

        let output = self.runner.run(&request).await?;
        for line in output.stdout_text().lines().filter(|l| !l.trim().is_empty()) {
            tracing::info!(target: "dbt", "{}", line);
        }

        let invocation = DbtInvocation {
            command: command.to_string(),
            success: output.success(),
            exit_code: output.exit_code,
            duration_ms: output.duration_ms,
        };

        if invocation.success {
            return Ok(invocation);
        }

        let tail = output.error_tail(ERROR_TAIL_LINES);
        if self.settings.fail_on_error {
            let mut err = AppError::new(
                ErrorCategory::ToolExecutionError,
                format!("dbt {} failed with exit code {}", command, output.exit_code),
            )
            .with_code("DBT-001")
            .with_suggestion("Inspect the dbt output above or rerun with RUST_LOG=debug")
            .with_suggestion("Pass --allow-dbt-failures to continue past failing dbt steps");
            err.add_context("command", &request.display());
            err.add_context("exit_code", &output.exit_code.to_string());
            if !tail.is_empty() {
                err.add_context("output", &tail);
            }
            return Err(err);
        }

        tracing::warn!(
            exit_code = output.exit_code,
            "dbt {} failed, continuing:\n{}",
            command,
            tail
        );
        Ok(invocation)
    }

    pub async fn invoke_all(&self, commands: &[&str]) -> Result<Vec<DbtInvocation>, AppError> {
        let mut invocations = Vec::with_capacity(commands.len());
        for command in commands {
            invocations.push(self.invoke(command).await?);
        }
        Ok(invocations)
    }
}
