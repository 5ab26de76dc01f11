#![allow(clippy::result_large_err)]

use super::{run_dbt_commands, FlowContext};
use crate::core::acquire::clone_repository;
use crate::core::dbt::{
    rewrite_project_profile, write_profiles, DbtRunner, DuckDbTarget, Profile, Target,
};
use crate::core::error::AppError;
use crate::core::task::run_task;
use crate::core::warehouse::duckdb::{create_database_blocking, verify_database_blocking};
use crate::core::warehouse::VerificationResults;
use crate::core::workspace::posix_string;
use serde::Serialize;
use std::path::PathBuf;

pub const DEFAULT_REPO_URL: &str = "https://github.com/tuva-health/demo";
pub const PROJECT_NAME: &str = "tuva_demo";
pub const PROFILE_NAME: &str = "tuva_demo";
pub const DATABASE_FILE: &str = "tuva_demo.duckdb";
const DBT_STEPS: [&str; 4] = ["deps", "seed", "run", "test"];

#[derive(Debug, Clone)]
pub struct TuvaOptions {
    pub repo_url: String,
    pub target_dir: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub allow_dbt_failures: bool,
}

impl Default for TuvaOptions {
    fn default() -> Self {
        TuvaOptions {
            repo_url: DEFAULT_REPO_URL.to_string(),
            target_dir: None,
            db_path: None,
            allow_dbt_failures: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TuvaResult {
    pub project_directory: PathBuf,
    pub database_path: PathBuf,
    pub profiles_directory: PathBuf,
    pub verification_results: VerificationResults,
}

/// Clone the Tuva Health demo, build it into DuckDB and count what landed.
pub async fn tuva_demo_flow(ctx: &FlowContext, options: &TuvaOptions) -> Result<TuvaResult, AppError> {
    let policy = ctx.task_policy()?;
    let runner = ctx.runner.as_ref();
    let git = ctx.git_executable();
    let repo_url = options.repo_url.as_str();

    let target = ctx.resolve_or(
        options.target_dir.as_deref(),
        ctx.workspace.dbt_dir().join(PROJECT_NAME),
    );
    let target = &target;
    let project_dir = run_task("clone_repository", policy, move || {
        clone_repository(runner, git, repo_url, target)
    })
    .await?;

    let database_path = ctx.resolve_or(
        options.db_path.as_deref(),
        ctx.workspace.data_dir().join(DATABASE_FILE),
    );
    let profiles_dir = ctx.workspace.config_dir();
    let (database, profiles) = (&database_path, &profiles_dir);
    run_task("setup_duckdb_profile", policy, move || async move {
        tracing::info!("Setting up DuckDB database at {}", database.display());
        create_database_blocking(database.clone()).await?;
        let profile = Profile::single(Target::Duckdb(DuckDbTarget {
            path: posix_string(database),
            threads: 4,
            extensions: vec!["httpfs".to_string()],
        }));
        write_profiles(profiles, PROFILE_NAME, &profile)
    })
    .await?;

    let project = &project_dir;
    run_task("update_dbt_project_config", policy, move || async move {
        rewrite_project_profile(project, PROFILE_NAME)
    })
    .await?;

    let settings = ctx.dbt_settings(&project_dir, &profiles_dir, options.allow_dbt_failures)?;
    let dbt = DbtRunner::new(runner, settings);
    for step in DBT_STEPS {
        run_dbt_commands(&dbt, &[step], policy).await?;
    }

    let verification_results = run_task("verify_results", policy, move || {
        verify_database_blocking(database.clone())
    })
    .await?;

    tracing::info!("Project directory: {}", project_dir.display());
    tracing::info!("Database path: {}", database_path.display());

    Ok(TuvaResult {
        project_directory: project_dir,
        database_path,
        profiles_directory: profiles_dir,
        verification_results,
    })
}
