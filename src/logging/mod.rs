pub mod config;
pub mod context;
pub mod layers;

pub use context::{detect_context, ExecutionContext};
pub use layers::console::ConsoleOutput;

use crate::cli::Args;
use crate::logging::config::LoggingConfig;
use crate::logging::layers::{console, file, opentelemetry, BoxLayer};
use crate::Result;
use anyhow::{anyhow, Context};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Keeps the file writer and span exporter alive for the duration of the command.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    _otel_guard: Option<opentelemetry::OpenTelemetryGuard>,
    console_output: ConsoleOutput,
    log_file_path: PathBuf,
}

impl LoggingGuard {
    pub fn console_output(&self) -> ConsoleOutput {
        self.console_output
    }

    pub fn log_file_path(&self) -> &Path {
        &self.log_file_path
    }
}

/// Install the global subscriber for this process.
///
/// `RUST_LOG` takes precedence over `logging.default_level`. The file sink lives
/// under the run root, the console sink follows [`detect_context`], and spans are
/// exported over OTLP when an endpoint is configured. Calling this twice is an error.
pub fn init(args: &Args) -> Result<LoggingGuard> {
    if LOGGER_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(anyhow!("logging already initialized"));
    }

    let context = detect_context();
    let root = resolve_root(&args.root);
    let config = LoggingConfig::load(root.as_deref())?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_level))
        .context("failed to configure tracing level")?;
    let log_file_path = file::log_file_path(&config, root.as_deref())?;

    let mut layers: Vec<BoxLayer<Registry>> = Vec::new();

    let (file_layer, file_guard) = file::file_layer::<Registry>(&log_file_path, config.enable_file)?;
    layers.push(file_layer);

    let console_output = console::select_console_output(context, config.console_output);
    layers.push(console::console_layer::<Registry>(console_output));

    let mut otel_guard = None;
    let mut otel_error = None;
    if config.opentelemetry.enabled {
        match opentelemetry::build_opentelemetry_layer::<Registry>(&config.opentelemetry) {
            Ok((layer, guard)) => {
                layers.push(layer);
                otel_guard = Some(guard);
            }
            Err(err) => otel_error = Some(err),
        }
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .context("failed to install tracing subscriber")?;

    if let Some(err) = otel_error {
        tracing::warn!("OpenTelemetry disabled: {:#}", err);
    }
    tracing::debug!(
        log_file = %log_file_path.display(),
        console = %console_output,
        "logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
        _otel_guard: otel_guard,
        console_output,
        log_file_path,
    })
}

fn resolve_root(root: &Path) -> Option<PathBuf> {
    if root.is_absolute() {
        return Some(root.to_path_buf());
    }
    env::current_dir().ok().map(|cwd| cwd.join(root))
}
