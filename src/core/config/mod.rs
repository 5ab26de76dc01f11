#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Main dbtflow configuration loaded from dbtflow.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DbtflowConfig {
    /// Directory layout under the run root
    #[serde(default)]
    pub paths: PathsConfig,

    /// dbt and git invocation settings
    #[serde(default)]
    pub dbt: DbtConfig,

    /// Retry policy applied to flow tasks
    #[serde(default)]
    pub retry: RetryConfig,

    /// Named Snowflake connectors
    #[serde(default)]
    pub connectors: BTreeMap<String, ConnectorConfig>,
}

/// Directory layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Where acquired dbt projects live
    #[serde(default = "default_dbt_dir")]
    pub dbt_dir: PathBuf,

    /// Where DuckDB files are written
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Where the shared profiles.yml is written
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,
}

/// dbt configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbtConfig {
    /// dbt executable name or path
    #[serde(default = "default_dbt_executable")]
    pub executable: String,

    /// git executable name or path
    #[serde(default = "default_git_executable")]
    pub git_executable: String,

    /// Fail the flow when a dbt subcommand exits non-zero
    #[serde(default = "default_fail_on_error")]
    pub fail_on_error: bool,

    /// Per-subcommand timeout, e.g. "30m"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Extra attempts after the first failure
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Delay between attempts, e.g. "5s"
    #[serde(default = "default_retry_delay")]
    pub delay: String,
}

/// A stored Snowflake connection. Secrets are referenced by environment
/// variable name so none end up in the file itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    pub account: String,
    pub user: String,
    pub database: String,
    pub warehouse: String,

    #[serde(default = "default_schema")]
    pub schema: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default = "default_authenticator")]
    pub authenticator: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Key file handed to dbt as private_key_path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_path: Option<PathBuf>,

    /// Variable holding PEM key material; written out next to profiles.yml
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_passphrase_env: Option<String>,

    /// Variable holding the SQL API token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Overrides https://<account>.snowflakecomputing.com
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

// Default functions
fn default_dbt_dir() -> PathBuf {
    PathBuf::from("dbt")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("config")
}

fn default_dbt_executable() -> String {
    "dbt".to_string()
}

fn default_git_executable() -> String {
    "git".to_string()
}

fn default_fail_on_error() -> bool {
    true
}

fn default_retries() -> u32 {
    2
}

fn default_retry_delay() -> String {
    "5s".to_string()
}

fn default_schema() -> String {
    "PUBLIC".to_string()
}

fn default_authenticator() -> String {
    "snowflake".to_string()
}

fn default_token_type() -> String {
    "PROGRAMMATIC_ACCESS_TOKEN".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            dbt_dir: default_dbt_dir(),
            data_dir: default_data_dir(),
            config_dir: default_config_dir(),
        }
    }
}

impl Default for DbtConfig {
    fn default() -> Self {
        DbtConfig {
            executable: default_dbt_executable(),
            git_executable: default_git_executable(),
            fail_on_error: default_fail_on_error(),
            timeout: None,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            retries: default_retries(),
            delay: default_retry_delay(),
        }
    }
}

impl DbtConfig {
    pub fn timeout(&self) -> Result<Option<Duration>, AppError> {
        self.timeout
            .as_deref()
            .map(|raw| parse_duration("dbt.timeout", raw))
            .transpose()
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Result<Duration, AppError> {
        parse_duration("retry.delay", &self.delay)
    }
}

fn parse_duration(key: &str, raw: &str) -> Result<Duration, AppError> {
    humantime::parse_duration(raw.trim()).map_err(|e| {
        AppError::new(
            ErrorCategory::ValidationError,
            format!("{} must be a duration like \"5s\" or \"30m\": {}", key, e),
        )
    })
}

pub mod loader;
pub mod validation;

pub use loader::ConfigLoader;
pub use validation::ConfigValidator;
