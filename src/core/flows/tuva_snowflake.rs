#![allow(clippy::result_large_err)]

use super::{run_dbt_commands, with_troubleshooting, FlowContext};
use crate::core::acquire::clone_repository;
use crate::core::dbt::{rewrite_project_profile, write_profiles, DbtRunner, Profile, SnowflakeTarget, Target};
use crate::core::error::AppError;
use crate::core::task::{run_task, TaskPolicy};
use crate::core::types::ErrorCategory;
use crate::core::warehouse::{PrivateKey, SnowflakeClient, SnowflakeConnector};
use crate::core::workspace::{ensure_dir, posix_string};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub use super::snowflake_demo::DEFAULT_CONNECTOR;
pub use super::tuva::DEFAULT_REPO_URL;

pub const PROJECT_NAME: &str = "tuva_snowflake_demo";
pub const PROFILE_NAME: &str = "tuva_snowflake";
pub const PRIVATE_KEY_FILE: &str = "snowflake_private_key.p8";
const DEFAULT_ROLE: &str = "PUBLIC";
const DBT_STEPS: [&str; 2] = ["run", "test"];

const CONNECTION_SQL: &str = "
SELECT
    CURRENT_TIMESTAMP() as current_time,
    CURRENT_USER() as current_user,
    CURRENT_DATABASE() as current_database,
    CURRENT_WAREHOUSE() as current_warehouse,
    CURRENT_SCHEMA() as current_schema
";

#[derive(Debug, Clone)]
pub struct TuvaSnowflakeOptions {
    pub repo_url: String,
    pub connector: String,
    pub target_dir: Option<PathBuf>,
    pub allow_dbt_failures: bool,
}

impl Default for TuvaSnowflakeOptions {
    fn default() -> Self {
        TuvaSnowflakeOptions {
            repo_url: DEFAULT_REPO_URL.to_string(),
            connector: DEFAULT_CONNECTOR.to_string(),
            target_dir: None,
            allow_dbt_failures: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    pub timestamp: Option<String>,
    pub user: Option<String>,
    pub database: Option<String>,
    pub warehouse: Option<String>,
    pub schema: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TuvaSnowflakeResult {
    pub connection_info: ConnectionInfo,
    pub project_directory: PathBuf,
    pub profiles_directory: PathBuf,
}

pub fn troubleshooting_tips(connector: &str) -> Vec<String> {
    vec![
        "Ensure dbt and the dbt-snowflake adapter are installed".to_string(),
        format!(
            "Verify connector '{}' exists in dbtflow.toml and is configured",
            connector
        ),
        "Check network connectivity to Snowflake".to_string(),
        "Verify your Snowflake account permissions and schema access".to_string(),
        "Ensure the database and schema specified in the connector exist".to_string(),
    ]
}

/// A target directory of literally `None` counts as unset.
fn normalize_target_dir(target_dir: Option<&Path>) -> Option<&Path> {
    target_dir.filter(|p| p.as_os_str() != "None" && !p.as_os_str().is_empty())
}

async fn test_snowflake_connection(client: &SnowflakeClient) -> Result<ConnectionInfo, AppError> {
    let mut row = client.fetch_one(CONNECTION_SQL).await?.into_iter();
    tracing::info!("Successfully connected to Snowflake!");
    let info = ConnectionInfo {
        timestamp: row.next().flatten(),
        user: row.next().flatten(),
        database: row.next().flatten(),
        warehouse: row.next().flatten(),
        schema: row.next().flatten(),
    };
    tracing::info!("Connection info: {:?}", info);
    Ok(info)
}

fn write_private_key(dir: &Path, pem: &str) -> Result<PathBuf, AppError> {
    let path = dir.join(PRIVATE_KEY_FILE);
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let key_error = |e: std::io::Error| {
        AppError::new(
            ErrorCategory::IoError,
            format!("failed to write private key to {}: {}", path.display(), e),
        )
        .with_code("SF-005")
    };
    let mut file = options.open(&path).map_err(key_error)?;
    file.write_all(pem.as_bytes()).map_err(key_error)?;

    // mode() only applies when the file is created
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
            .map_err(key_error)?;
    }

    tracing::info!("Private key written to {}", path.display());
    Ok(path)
}

/// Build the dbt target for `connector`, writing inline key material into
/// `profiles_dir` when the connector carries it.
pub fn snowflake_target(
    connector: &SnowflakeConnector,
    profiles_dir: &Path,
) -> Result<SnowflakeTarget, AppError> {
    let private_key_path = match &connector.private_key {
        Some(PrivateKey::Path(path)) => Some(posix_string(path)),
        Some(PrivateKey::Inline(pem)) => Some(posix_string(&write_private_key(profiles_dir, pem)?)),
        None => None,
    };
    let private_key_passphrase = private_key_path
        .as_ref()
        .and(connector.private_key_passphrase.clone());

    Ok(SnowflakeTarget {
        account: connector.account.clone(),
        user: connector.user.clone(),
        password: connector.password.clone().unwrap_or_default(),
        role: connector
            .role
            .clone()
            .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
        database: connector.database.clone(),
        warehouse: connector.warehouse.clone(),
        schema: connector.schema.clone(),
        authenticator: connector.authenticator.clone(),
        private_key_path,
        private_key_passphrase,
        threads: 4,
        client_session_keep_alive: false,
        query_tag: "tuva".to_string(),
    })
}

/// Clone the Tuva Health demo and build it into the connector's warehouse.
pub async fn tuva_snowflake_flow(
    ctx: &FlowContext,
    options: &TuvaSnowflakeOptions,
) -> Result<TuvaSnowflakeResult, AppError> {
    tracing::info!("Starting Tuva Health Flow with Snowflake");

    let outcome = async {
        let policy = ctx.task_policy()?;
        let client = ctx.snowflake_client(&options.connector)?;
        let client = &client;

        let connection_info = run_task("test_snowflake_connection", policy, move || {
            test_snowflake_connection(client)
        })
        .await?;

        let runner = ctx.runner.as_ref();
        let git = ctx.git_executable();
        let repo_url = options.repo_url.as_str();
        let target = ctx.resolve_or(
            normalize_target_dir(options.target_dir.as_deref()),
            ctx.workspace.dbt_dir().join(PROJECT_NAME),
        );
        let target = &target;
        let project_dir = run_task("clone_repository", policy, move || {
            clone_repository(runner, git, repo_url, target)
        })
        .await?;

        let profiles_dir = ctx.workspace.config_dir();
        let (profiles, connector) = (&profiles_dir, client.connector());
        run_task("setup_snowflake_profile", TaskPolicy::once(), move || async move {
            ensure_dir(profiles)?;
            let target = snowflake_target(connector, profiles)?;
            write_profiles(profiles, PROFILE_NAME, &Profile::single(Target::Snowflake(target)))
        })
        .await?;

        let project = &project_dir;
        run_task("update_dbt_project_config", TaskPolicy::once(), move || async move {
            rewrite_project_profile(project, PROFILE_NAME)
        })
        .await?;

        let settings =
            ctx.dbt_settings(&project_dir, &profiles_dir, options.allow_dbt_failures)?;
        let dbt = DbtRunner::new(runner, settings);
        for step in DBT_STEPS {
            run_dbt_commands(&dbt, &[step], TaskPolicy::once()).await?;
        }

        tracing::info!("Project directory: {}", project_dir.display());
        Ok::<_, AppError>(TuvaSnowflakeResult {
            connection_info,
            project_directory: project_dir,
            profiles_directory: profiles_dir,
        })
    }
    .await;

    outcome.map_err(|err| {
        with_troubleshooting(
            err,
            "Tuva Snowflake run",
            &troubleshooting_tips(&options.connector),
        )
    })
}
