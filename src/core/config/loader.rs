#![allow(clippy::result_large_err)]

use super::DbtflowConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::env;
use std::path::{Path, PathBuf};

/// File name looked up in the run root.
pub const CONFIG_FILE_NAME: &str = "dbtflow.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from the run root (root/dbtflow.toml)
    /// Environment variables override config file values
    /// A missing file yields defaults + env vars
    pub fn load_from_root(root: &Path) -> Result<DbtflowConfig, AppError> {
        let config_path = root.join(CONFIG_FILE_NAME);
        Self::load(&config_path)
    }

    /// Load config from an explicit path, applying env overrides
    pub fn load(path: &Path) -> Result<DbtflowConfig, AppError> {
        let mut config = Self::load_from_file(path)?.unwrap_or_default();
        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Load config from specific file path
    /// Returns Ok(None) if file doesn't exist
    pub fn load_from_file(path: &Path) -> Result<Option<DbtflowConfig>, AppError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to read config file {}: {}", path.display(), e),
            )
        })?;

        let config: DbtflowConfig = toml::from_str(&content).map_err(|e| {
            AppError::new(
                ErrorCategory::ValidationError,
                format!("Failed to parse config file {}: {}", path.display(), e),
            )
        })?;

        Ok(Some(config))
    }

    /// Environment variables take precedence over config file values
    fn apply_env_overrides(config: &mut DbtflowConfig) {
        if let Ok(executable) = env::var("DBTFLOW_DBT_EXECUTABLE") {
            config.dbt.executable = executable;
        }

        if let Ok(git) = env::var("DBTFLOW_GIT_EXECUTABLE") {
            config.dbt.git_executable = git;
        }

        if let Ok(fail_str) = env::var("DBTFLOW_FAIL_ON_ERROR") {
            if let Ok(fail_on_error) = fail_str.parse::<bool>() {
                config.dbt.fail_on_error = fail_on_error;
            }
        }

        if let Ok(dbt_dir) = env::var("DBTFLOW_DBT_DIR") {
            config.paths.dbt_dir = PathBuf::from(dbt_dir);
        }

        if let Ok(data_dir) = env::var("DBTFLOW_DATA_DIR") {
            config.paths.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(config_dir) = env::var("DBTFLOW_CONFIG_DIR") {
            config.paths.config_dir = PathBuf::from(config_dir);
        }

        if let Ok(retries_str) = env::var("DBTFLOW_RETRIES") {
            if let Ok(retries) = retries_str.parse::<u32>() {
                config.retry.retries = retries;
            }
        }

        if let Ok(delay) = env::var("DBTFLOW_RETRY_DELAY") {
            config.retry.delay = delay;
        }
    }
}
