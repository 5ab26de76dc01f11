#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::Path;

pub trait Serializer {
    fn serialize<T: Serialize>(&self, data: &T) -> Result<Vec<u8>, AppError>;
    fn deserialize<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, AppError>;
}

/// JSON encoding; pretty-printed unless built with [`JsonSerializer::compact`].
#[derive(Debug, Clone, Copy)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    pub const fn pretty() -> Self {
        JsonSerializer { pretty: true }
    }

    pub const fn compact() -> Self {
        JsonSerializer { pretty: false }
    }
}

impl Default for JsonSerializer {
    fn default() -> Self {
        Self::pretty()
    }
}

impl Serializer for JsonSerializer {
    fn serialize<T: Serialize>(&self, data: &T) -> Result<Vec<u8>, AppError> {
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(data)
        } else {
            serde_json::to_vec(data)
        };
        encoded.map_err(|e| {
            AppError::with_source(ErrorCategory::SerializationError, "failed to encode JSON", e)
                .with_code("SER-001")
        })
    }

    fn deserialize<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, AppError> {
        serde_json::from_slice(data).map_err(|e| {
            AppError::with_source(ErrorCategory::SerializationError, "failed to decode JSON", e)
                .with_code("SER-002")
        })
    }
}

pub trait FileSerializer {
    fn save_to_file<T: Serialize, S: Serializer>(
        &self,
        path: &Path,
        data: &T,
        serializer: &S,
    ) -> Result<(), AppError>;

    fn load_from_file<T: DeserializeOwned, S: Serializer>(
        &self,
        path: &Path,
        serializer: &S,
    ) -> Result<T, AppError>;
}

pub struct FileUtils;

impl FileSerializer for FileUtils {
    /// Writes through a sibling temp file so readers never see a partial file.
    fn save_to_file<T: Serialize, S: Serializer>(
        &self,
        path: &Path,
        data: &T,
        serializer: &S,
    ) -> Result<(), AppError> {
        let content = serializer.serialize(data)?;
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        let mut staged = tempfile::NamedTempFile::new_in(parent)?;
        std::io::Write::write_all(&mut staged, &content)?;
        staged.persist(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("failed to write {}: {}", path.display(), e.error),
            )
            .with_code("SER-003")
        })?;
        Ok(())
    }

    fn load_from_file<T: DeserializeOwned, S: Serializer>(
        &self,
        path: &Path,
        serializer: &S,
    ) -> Result<T, AppError> {
        let content = fs::read(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("failed to read {}: {}", path.display(), e),
            )
            .with_code("SER-004")
        })?;
        serializer.deserialize(&content)
    }
}
