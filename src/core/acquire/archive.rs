#![allow(clippy::result_large_err)]

use crate::core::dbt::project::PROJECT_FILE_NAME;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::core::workspace::ensure_dir;
use std::collections::VecDeque;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

const STAGING_PREFIX: &str = "_tmp_extract";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("download of {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("zip entry escapes the extraction directory: {0}")]
    UnsafeEntry(String),

    #[error("dbt_project.yml not found")]
    ProjectNotFound,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ArchiveError> for AppError {
    fn from(err: ArchiveError) -> Self {
        let (category, code) = match &err {
            ArchiveError::Http(_) | ArchiveError::Status { .. } => {
                (ErrorCategory::NetworkError, "ARCHIVE-001")
            }
            ArchiveError::Zip(_) | ArchiveError::UnsafeEntry(_) => {
                (ErrorCategory::ValidationError, "ARCHIVE-002")
            }
            ArchiveError::ProjectNotFound => (ErrorCategory::ValidationError, "ARCHIVE-003"),
            ArchiveError::Io(_) => (ErrorCategory::IoError, "ARCHIVE-004"),
        };
        AppError::new(category, err.to_string()).with_code(code)
    }
}

pub async fn fetch_archive(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, ArchiveError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ArchiveError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.bytes().await?.to_vec())
}

/// Unpack `bytes` under `dest`, refusing entries that would land outside it.
pub fn extract_archive(bytes: &[u8], dest: &Path) -> Result<usize, ArchiveError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut written = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| ArchiveError::UnsafeEntry(entry.name().to_string()))?;
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&out_path)?;
        std::io::copy(&mut entry, &mut out)?;
        written += 1;
    }

    Ok(written)
}

/// Shallowest directory under `root` holding a dbt_project.yml. Siblings at
/// the same depth are visited in name order.
pub fn find_project_root(root: &Path) -> Result<Option<PathBuf>, ArchiveError> {
    let mut queue = VecDeque::from([root.to_path_buf()]);

    while let Some(dir) = queue.pop_front() {
        if dir.join(PROJECT_FILE_NAME).is_file() {
            return Ok(Some(dir));
        }

        let mut children: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        children.sort();
        queue.extend(children);
    }

    Ok(None)
}

fn install_archive(bytes: &[u8], dbt_dir: &Path, project_dir: &Path) -> Result<(), ArchiveError> {
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(dbt_dir)?;

    let entries = extract_archive(bytes, staging.path())?;
    tracing::debug!(entries, staging = %staging.path().display(), "archive extracted");

    let project_root = find_project_root(staging.path())?.ok_or(ArchiveError::ProjectNotFound)?;
    fs::rename(&project_root, project_dir)?;
    Ok(())
}

/// Download a zipped dbt project into `dbt_dir/name`, reusing it if present.
pub async fn download_project(
    client: &reqwest::Client,
    url: &str,
    dbt_dir: &Path,
    name: &str,
) -> Result<PathBuf, AppError> {
    let project_dir = dbt_dir.join(name);
    if project_dir.exists() {
        tracing::info!("Using cached project at {}", project_dir.display());
        return Ok(project_dir);
    }

    ensure_dir(dbt_dir)?;
    tracing::info!("Downloading: {}", url);
    let bytes = fetch_archive(client, url).await?;

    let dbt_dir = dbt_dir.to_path_buf();
    let destination = project_dir.clone();
    tokio::task::spawn_blocking(move || install_archive(&bytes, &dbt_dir, &destination))
        .await??;

    tracing::info!("Extracted to {}", project_dir.display());
    Ok(project_dir)
}
