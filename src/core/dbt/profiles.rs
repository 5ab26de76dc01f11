#![allow(clippy::result_large_err)]

//! dbt `profiles.yml` generation.

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::core::workspace::ensure_dir;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const PROFILES_FILE_NAME: &str = "profiles.yml";
pub const DEFAULT_TARGET: &str = "dev";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub outputs: BTreeMap<String, Target>,
    pub target: String,
}

impl Profile {
    /// Profile with a single `dev` output.
    pub fn single(target: Target) -> Self {
        Profile {
            outputs: BTreeMap::from([(DEFAULT_TARGET.to_string(), target)]),
            target: DEFAULT_TARGET.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Target {
    Duckdb(DuckDbTarget),
    Snowflake(SnowflakeTarget),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuckDbTarget {
    pub path: String,
    pub threads: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnowflakeTarget {
    pub account: String,
    pub user: String,
    pub password: String,
    pub role: String,
    pub database: String,
    pub warehouse: String,
    pub schema: String,
    pub authenticator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_passphrase: Option<String>,
    pub threads: u32,
    pub client_session_keep_alive: bool,
    pub query_tag: String,
}

pub fn render_profiles(name: &str, profile: &Profile) -> Result<String, AppError> {
    let document = BTreeMap::from([(name, profile)]);
    serde_yaml::to_string(&document).map_err(|e| {
        AppError::with_source(
            ErrorCategory::SerializationError,
            format!("failed to render profile {}", name),
            e,
        )
    })
}

/// Write `<dir>/profiles.yml` holding `name`, replacing any previous file.
pub fn write_profiles(dir: &Path, name: &str, profile: &Profile) -> Result<PathBuf, AppError> {
    ensure_dir(dir)?;
    let path = dir.join(PROFILES_FILE_NAME);
    let rendered = render_profiles(name, profile)?;
    std::fs::write(&path, rendered).map_err(|e| {
        AppError::new(
            ErrorCategory::IoError,
            format!("failed to write {}: {}", path.display(), e),
        )
        .with_code("DBT-003")
    })?;
    tracing::info!(profile = name, path = %path.display(), "dbt profile configured");
    Ok(path)
}
