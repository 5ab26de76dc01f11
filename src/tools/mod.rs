//! External process seam.
//!
//! Flows never spawn `git` or `dbt` directly; they build a
//! [`CommandExecutionRequest`] and hand it to a [`CommandRunner`]. The
//! production runner is [`execution::TokioCommandRunner`]; tests swap in
//! [`scripted::ScriptedCommandRunner`].

#![allow(clippy::result_large_err)]

pub mod execution;
pub mod scripted;

use crate::core::error::AppError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

pub use execution::TokioCommandRunner;
pub use scripted::ScriptedCommandRunner;

const OUTPUT_CAPTURE_LIMIT_BYTES: usize = 1_048_576;

/// A single program invocation. Arguments are passed as-is, no shell.
#[derive(Clone, Debug, Default)]
pub struct CommandExecutionRequest {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
}

impl CommandExecutionRequest {
    pub fn new(program: impl Into<String>) -> Self {
        CommandExecutionRequest {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Command line as a user would type it, for logs and error context.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Clone, Debug, Default)]
pub struct CommandExecutionOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
    pub duration_ms: u64,
}

impl CommandExecutionOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stdout_text(&self) -> String {
        limit_bytes(&self.stdout)
    }

    pub fn stderr_text(&self) -> String {
        limit_bytes(&self.stderr)
    }

    /// Last `lines` lines of stderr, falling back to stdout when stderr is
    /// empty (dbt reports most failures on stdout).
    pub fn error_tail(&self, lines: usize) -> String {
        let text = if self.stderr.iter().all(u8::is_ascii_whitespace) {
            self.stdout_text()
        } else {
            self.stderr_text()
        };
        let collected: Vec<&str> = text.lines().collect();
        let start = collected.len().saturating_sub(lines);
        collected[start..].join("\n")
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync + 'static {
    async fn run(&self, request: &CommandExecutionRequest)
        -> Result<CommandExecutionOutput, AppError>;
}

fn limit_bytes(bytes: &[u8]) -> String {
    let limit = OUTPUT_CAPTURE_LIMIT_BYTES.min(bytes.len());
    String::from_utf8_lossy(&bytes[..limit]).into_owned()
}
