#![allow(clippy::result_large_err)]

use crate::core::config::PathsConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::fs;
use std::path::{Path, PathBuf};

const STATE_DIR: &str = ".dbtflow";

/// Path bookkeeping for a single run root.
///
/// Relative entries in [`PathsConfig`] resolve against the root; absolute
/// ones are used as given.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    paths: PathsConfig,
}

impl Workspace {
    pub fn new(root: &Path, paths: &PathsConfig) -> Result<Self, AppError> {
        let root = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| {
                    AppError::new(
                        ErrorCategory::WorkspaceError,
                        format!("cannot determine current directory: {}", e),
                    )
                })?
                .join(root)
        };

        Ok(Workspace {
            root,
            paths: paths.clone(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn dbt_dir(&self) -> PathBuf {
        self.resolve(&self.paths.dbt_dir)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.resolve(&self.paths.data_dir)
    }

    pub fn config_dir(&self) -> PathBuf {
        self.resolve(&self.paths.config_dir)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.state_dir().join("runs")
    }
}

/// Create `path` (and parents) when missing and hand it back.
pub fn ensure_dir(path: &Path) -> Result<PathBuf, AppError> {
    fs::create_dir_all(path).map_err(|e| {
        AppError::new(
            ErrorCategory::WorkspaceError,
            format!("failed to create directory {}: {}", path.display(), e),
        )
        .with_code("WS-001")
    })?;
    Ok(path.to_path_buf())
}

/// Render a path with forward slashes, the form dbt profiles expect.
pub fn posix_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
