#![allow(clippy::result_large_err)]

use super::{run_dbt_commands, FlowContext};
use crate::core::acquire::download_project;
use crate::core::dbt::{write_profiles, DbtInvocation, DbtRunner, DuckDbTarget, Profile, Target};
use crate::core::error::AppError;
use crate::core::task::run_task;
use crate::core::workspace::{ensure_dir, posix_string};
use serde::Serialize;
use std::path::PathBuf;

pub const DEFAULT_REPO_ZIP: &str =
    "https://github.com/PrefectHQ/examples/archive/refs/heads/examples-markdown.zip";
pub const PROJECT_NAME: &str = "dbt_demo";
pub const PROFILE_NAME: &str = "demo";
pub const DATABASE_FILE: &str = "demo.duckdb";
const DBT_STEPS: [&str; 4] = ["deps", "seed", "run", "test"];

#[derive(Debug, Clone)]
pub struct DbtDemoOptions {
    pub zip_url: String,
    pub allow_dbt_failures: bool,
}

impl Default for DbtDemoOptions {
    fn default() -> Self {
        DbtDemoOptions {
            zip_url: DEFAULT_REPO_ZIP.to_string(),
            allow_dbt_failures: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DbtDemoResult {
    pub project_directory: PathBuf,
    pub database_path: PathBuf,
    pub invocations: Vec<DbtInvocation>,
}

/// Download the demo project, point it at a local DuckDB file and build it.
pub async fn dbt_flow(ctx: &FlowContext, options: &DbtDemoOptions) -> Result<DbtDemoResult, AppError> {
    let policy = ctx.task_policy()?;
    let http = &ctx.http;
    let zip_url = options.zip_url.as_str();
    let dbt_dir = ctx.workspace.dbt_dir();
    let dbt_dir = &dbt_dir;

    let project_dir = run_task("build_dbt_demo", policy, move || {
        download_project(http, zip_url, dbt_dir, PROJECT_NAME)
    })
    .await?;

    let database_path = ctx.workspace.data_dir().join(DATABASE_FILE);
    let (project, database) = (&project_dir, &database_path);
    run_task("create_dbt_profiles", policy, move || async move {
        if let Some(data_dir) = database.parent() {
            ensure_dir(data_dir)?;
        }
        let profile = Profile::single(Target::Duckdb(DuckDbTarget {
            path: posix_string(database),
            threads: 1,
            extensions: Vec::new(),
        }));
        write_profiles(project, PROFILE_NAME, &profile)
    })
    .await?;

    let settings = ctx.dbt_settings(&project_dir, &project_dir, options.allow_dbt_failures)?;
    let dbt = DbtRunner::new(ctx.runner.as_ref(), settings);
    let mut invocations = Vec::new();
    for step in DBT_STEPS {
        invocations.extend(run_dbt_commands(&dbt, &[step], policy).await?);
    }

    tracing::info!("Done! Output at: {}", database_path.display());
    Ok(DbtDemoResult {
        project_directory: project_dir,
        database_path,
        invocations,
    })
}
