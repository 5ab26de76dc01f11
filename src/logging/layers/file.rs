use crate::logging::config::LoggingConfig;
use crate::logging::layers::{noop_layer, BoxLayer};
use crate::Result;
use anyhow::{anyhow, Context};
use dirs_next::home_dir;
use std::fs::{create_dir_all, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::{self as tracing_fmt, writer::BoxMakeWriter};
use tracing_subscriber::registry::LookupSpan;

pub const LOG_FILE_NAME: &str = "dbtflow.log";

/// `<log_dir>/dbtflow.log`, where the directory defaults to `<root>/.dbtflow/logs`.
pub fn log_file_path(config: &LoggingConfig, root: Option<&Path>) -> Result<PathBuf> {
    let directory = resolve_log_dir(config, root)?;
    Ok(directory.join(LOG_FILE_NAME))
}

/// Appends to `log_file` through a non-blocking writer. The guard must outlive the subscriber.
pub fn file_layer<S>(log_file: &Path, enabled: bool) -> Result<(BoxLayer<S>, Option<WorkerGuard>)>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    if !enabled {
        return Ok((noop_layer(), None));
    }

    ensure_log_dir(log_file)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("failed to open log file {}", log_file.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let layer = tracing_fmt::layer()
        .with_writer(BoxMakeWriter::new(non_blocking))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false);
    Ok((Box::new(layer), Some(guard)))
}

fn ensure_log_dir(log_file: &Path) -> Result<()> {
    let directory = log_file.parent().ok_or_else(|| {
        anyhow!(
            "log file path {} has no parent directory",
            log_file.display()
        )
    })?;
    create_dir_all(directory)
        .with_context(|| format!("failed to create log directory {}", directory.display()))?;
    Ok(())
}

fn resolve_log_dir(config: &LoggingConfig, root: Option<&Path>) -> Result<PathBuf> {
    let anchor = match root {
        Some(root) => root.to_path_buf(),
        None => home_base()?,
    };
    let base_dir = match &config.log_dir {
        Some(custom) if custom.is_absolute() => return Ok(custom.clone()),
        Some(custom) => anchor.join(custom),
        None => anchor.join(".dbtflow").join("logs"),
    };

    let normalized = canonicalize_or_clone(&base_dir);
    let anchor = canonicalize_or_clone(&anchor);
    if !normalized.starts_with(&anchor) {
        return Err(anyhow!(
            "logging.log_dir resolves outside {}",
            anchor.display()
        ));
    }
    Ok(normalized)
}

fn home_base() -> Result<PathBuf> {
    home_dir().ok_or_else(|| anyhow!("$HOME directory unavailable"))
}

fn canonicalize_or_clone(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
