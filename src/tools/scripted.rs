#![allow(clippy::result_large_err)]

use super::{CommandExecutionOutput, CommandExecutionRequest, CommandRunner};
use crate::core::error::AppError;
use async_trait::async_trait;
use std::sync::Mutex;

type Handler =
    dyn Fn(&CommandExecutionRequest) -> Result<CommandExecutionOutput, AppError> + Send + Sync;

/// Runner that answers from a closure instead of spawning processes and
/// keeps every request it saw. Used to drive flows without git or dbt
/// installed.
pub struct ScriptedCommandRunner {
    handler: Box<Handler>,
    requests: Mutex<Vec<CommandExecutionRequest>>,
}

impl ScriptedCommandRunner {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&CommandExecutionRequest) -> Result<CommandExecutionOutput, AppError>
            + Send
            + Sync
            + 'static,
    {
        ScriptedCommandRunner {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every command exits 0 with empty output.
    pub fn succeeding() -> Self {
        Self::new(|_| Ok(CommandExecutionOutput::default()))
    }

    pub fn requests(&self) -> Vec<CommandExecutionRequest> {
        match self.requests.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Recorded command lines, in call order.
    pub fn command_lines(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(CommandExecutionRequest::display)
            .collect()
    }
}

impl CommandExecutionOutput {
    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        CommandExecutionOutput {
            stdout: stdout.into().into_bytes(),
            ..Default::default()
        }
    }

    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        CommandExecutionOutput {
            stderr: stderr.into().into_bytes(),
            exit_code,
            ..Default::default()
        }
    }
}

#[async_trait]
impl CommandRunner for ScriptedCommandRunner {
    async fn run(
        &self,
        request: &CommandExecutionRequest,
    ) -> Result<CommandExecutionOutput, AppError> {
        match self.requests.lock() {
            Ok(mut guard) => guard.push(request.clone()),
            Err(poisoned) => poisoned.into_inner().push(request.clone()),
        }
        (self.handler)(request)
    }
}
