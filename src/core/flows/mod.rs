#![allow(clippy::result_large_err)]

//! The demo flows and the context they share.
//!
//! Each flow is a fixed sequence of named tasks (see [`crate::core::task`])
//! run inside a `flow` span. Flows are independent of one another; the only
//! thing they share is the [`FlowContext`] built by the CLI.

pub mod dbt_demo;
pub mod hello;
pub mod snowflake_demo;
pub mod tuva;
pub mod tuva_snowflake;

use crate::core::config::DbtflowConfig;
use crate::core::dbt::{DbtInvocation, DbtRunner, DbtSettings};
use crate::core::error::AppError;
use crate::core::task::{run_task, TaskPolicy};
use crate::core::types::{ErrorCategory, FlowKind};
use crate::core::warehouse::{SnowflakeClient, SnowflakeConnector};
use crate::core::workspace::Workspace;
use crate::tools::{CommandRunner, TokioCommandRunner};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

pub use dbt_demo::DbtDemoOptions;
pub use snowflake_demo::SnowflakeDemoOptions;
pub use tuva::TuvaOptions;
pub use tuva_snowflake::TuvaSnowflakeOptions;

const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

pub struct FlowContext {
    pub workspace: Workspace,
    pub config: DbtflowConfig,
    pub runner: Arc<dyn CommandRunner>,
    pub http: reqwest::Client,
}

impl FlowContext {
    pub fn new(workspace: Workspace, config: DbtflowConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("dbtflow/", env!("CARGO_PKG_VERSION")))
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorCategory::NetworkError, "failed to build HTTP client", e)
            })?;

        Ok(FlowContext {
            workspace,
            config,
            runner: Arc::new(TokioCommandRunner),
            http,
        })
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Retry policy from `[retry]`.
    pub fn task_policy(&self) -> Result<TaskPolicy, AppError> {
        TaskPolicy::from_config(&self.config.retry)
    }

    pub fn dbt_settings(
        &self,
        project_dir: &Path,
        profiles_dir: &Path,
        allow_failures: bool,
    ) -> Result<DbtSettings, AppError> {
        Ok(DbtSettings {
            executable: self.config.dbt.executable.clone(),
            project_dir: project_dir.to_path_buf(),
            profiles_dir: profiles_dir.to_path_buf(),
            fail_on_error: self.config.dbt.fail_on_error && !allow_failures,
            timeout: self.config.dbt.timeout()?,
        })
    }

    pub fn git_executable(&self) -> &str {
        &self.config.dbt.git_executable
    }

    pub fn snowflake_client(&self, connector: &str) -> Result<SnowflakeClient, AppError> {
        tracing::info!("Loading Snowflake connector: {}", connector);
        let connector = SnowflakeConnector::load(&self.config, connector)?;
        Ok(SnowflakeClient::new(self.http.clone(), connector)?)
    }

    /// Resolve an optional user path against the run root, or fall back.
    pub fn resolve_or(&self, path: Option<&Path>, fallback: PathBuf) -> PathBuf {
        path.map(|p| self.workspace.resolve(p)).unwrap_or(fallback)
    }
}

/// A flow plus its options, as selected on the command line.
#[derive(Debug, Clone)]
pub enum FlowRequest {
    Hello,
    DbtDemo(DbtDemoOptions),
    Tuva(TuvaOptions),
    SnowflakeDemo(SnowflakeDemoOptions),
    TuvaSnowflake(TuvaSnowflakeOptions),
}

impl FlowRequest {
    pub fn kind(&self) -> FlowKind {
        match self {
            FlowRequest::Hello => FlowKind::Hello,
            FlowRequest::DbtDemo(_) => FlowKind::DbtDemo,
            FlowRequest::Tuva(_) => FlowKind::Tuva,
            FlowRequest::SnowflakeDemo(_) => FlowKind::SnowflakeDemo,
            FlowRequest::TuvaSnowflake(_) => FlowKind::TuvaSnowflake,
        }
    }
}

/// Run one flow to completion and return its result as JSON.
pub async fn run_flow(
    ctx: &FlowContext,
    request: FlowRequest,
) -> Result<serde_json::Value, AppError> {
    let kind = request.kind();
    let span = tracing::info_span!("flow", name = kind.display_name());

    async move {
        tracing::info!("Starting {}", kind.display_name());
        let value = match request {
            FlowRequest::Hello => to_value(hello::basic_test_flow().await?),
            FlowRequest::DbtDemo(options) => to_value(dbt_demo::dbt_flow(ctx, &options).await?),
            FlowRequest::Tuva(options) => to_value(tuva::tuva_demo_flow(ctx, &options).await?),
            FlowRequest::SnowflakeDemo(options) => {
                to_value(snowflake_demo::snowflake_demo_flow(ctx, &options).await?)
            }
            FlowRequest::TuvaSnowflake(options) => {
                to_value(tuva_snowflake::tuva_snowflake_flow(ctx, &options).await?)
            }
        }?;
        tracing::info!("{} completed successfully", kind.display_name());
        Ok(value)
    }
    .instrument(span)
    .await
}

fn to_value<T: Serialize>(result: T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(result).map_err(|e| {
        AppError::with_source(
            ErrorCategory::SerializationError,
            "failed to serialize flow result",
            e,
        )
    })
}

/// One `run_dbt_commands` task: run `commands` in order under `policy`.
pub(crate) async fn run_dbt_commands(
    dbt: &DbtRunner<'_>,
    commands: &[&str],
    policy: TaskPolicy,
) -> Result<Vec<DbtInvocation>, AppError> {
    tracing::info!("Running: {:?}", commands);
    run_task("run_dbt_commands", policy, move || dbt.invoke_all(commands)).await
}

/// Log troubleshooting tips for a failed flow and attach them to the error.
pub(crate) fn with_troubleshooting(mut err: AppError, flow: &str, tips: &[String]) -> AppError {
    tracing::error!("Error during {}: {}", flow, err.message);
    tracing::info!("Troubleshooting tips:");
    for (index, tip) in tips.iter().enumerate() {
        tracing::info!("{}. {}", index + 1, tip);
        err = err.with_suggestion(tip.clone());
    }
    err
}
