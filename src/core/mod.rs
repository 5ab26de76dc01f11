pub mod acquire;
pub mod config;
pub mod dbt;
pub mod error;
pub mod flows;
pub mod history_recorder;
pub mod results_processor;
pub mod task;
pub mod types;
pub mod warehouse;
pub mod workspace;

pub use config::{ConfigLoader, ConfigValidator, DbtflowConfig};
pub use error::{AppError, DefaultErrorReporter, ErrorReporter};
pub use history_recorder::{RunHistoryRecorder, RunRecord};
pub use results_processor::{OutputFormat, ResultsProcessor};
pub use task::{run_task, TaskPolicy};
pub use types::*;
pub use workspace::Workspace;
