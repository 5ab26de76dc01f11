#![allow(clippy::result_large_err)]

use super::{ConnectorConfig, DbtflowConfig};
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use regex::Regex;
use std::sync::OnceLock;

const MAX_RETRIES: u32 = 10;

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration rules
    pub fn validate(config: &DbtflowConfig) -> Result<(), AppError> {
        if config.dbt.executable.trim().is_empty() {
            return Err(invalid("dbt.executable cannot be empty"));
        }

        if config.dbt.git_executable.trim().is_empty() {
            return Err(invalid("dbt.git_executable cannot be empty"));
        }

        for (key, path) in [
            ("paths.dbt_dir", &config.paths.dbt_dir),
            ("paths.data_dir", &config.paths.data_dir),
            ("paths.config_dir", &config.paths.config_dir),
        ] {
            if path.as_os_str().is_empty() {
                return Err(invalid(format!("{} cannot be empty", key)));
            }
        }

        if config.retry.retries > MAX_RETRIES {
            return Err(invalid(format!(
                "retry.retries must be at most {}",
                MAX_RETRIES
            )));
        }
        config.retry.delay()?;
        config.dbt.timeout()?;

        for (name, connector) in &config.connectors {
            Self::validate_connector(name, connector)?;
        }

        Ok(())
    }

    fn validate_connector(name: &str, connector: &ConnectorConfig) -> Result<(), AppError> {
        for (field, value) in [
            ("account", &connector.account),
            ("user", &connector.user),
            ("database", &connector.database),
            ("warehouse", &connector.warehouse),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(format!(
                    "connectors.{}.{} cannot be empty",
                    name, field
                )));
            }
        }

        for (field, value) in [
            ("password_env", &connector.password_env),
            ("private_key_env", &connector.private_key_env),
            ("private_key_passphrase_env", &connector.private_key_passphrase_env),
            ("token_env", &connector.token_env),
        ] {
            if let Some(var) = value {
                if !env_var_name().is_match(var) {
                    return Err(invalid(format!(
                        "connectors.{}.{} must name an environment variable, got '{}'",
                        name, field, var
                    )));
                }
            }
        }

        if connector.private_key_path.is_some() && connector.private_key_env.is_some() {
            return Err(invalid(format!(
                "connectors.{} sets both private_key_path and private_key_env",
                name
            )));
        }

        Ok(())
    }
}

fn env_var_name() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"))
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::new(ErrorCategory::ValidationError, message).with_code("CONFIG-001")
}
