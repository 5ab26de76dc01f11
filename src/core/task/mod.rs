#![allow(clippy::result_large_err)]

//! Named flow tasks with a fixed retry policy.
//!
//! A task is an async operation that may be attempted several times. Every
//! attempt runs inside a `task` span so its log lines are attributed to the
//! task and attempt number; the final error is returned untouched apart from
//! `task`/`attempts` context entries.

use crate::core::config::RetryConfig;
use crate::core::error::AppError;
use std::future::Future;
use std::time::Duration;
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl TaskPolicy {
    /// Run once, never retry.
    pub const fn once() -> Self {
        TaskPolicy {
            retries: 0,
            delay: Duration::ZERO,
        }
    }

    pub const fn new(retries: u32, delay: Duration) -> Self {
        TaskPolicy { retries, delay }
    }

    pub fn from_config(config: &RetryConfig) -> Result<Self, AppError> {
        Ok(TaskPolicy {
            retries: config.retries,
            delay: config.delay()?,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

impl Default for TaskPolicy {
    fn default() -> Self {
        TaskPolicy::new(2, Duration::from_secs(5))
    }
}

/// Run `op` under `policy`, retrying on error.
pub async fn run_task<T, F, Fut>(name: &str, policy: TaskPolicy, mut op: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;

    loop {
        let span = tracing::info_span!("task", name = name, attempt = attempt);
        match op().instrument(span).await {
            Ok(value) => {
                tracing::debug!(task = name, attempt, "task completed");
                return Ok(value);
            }
            Err(err) if attempt < max_attempts => {
                tracing::warn!(
                    task = name,
                    attempt,
                    max_attempts,
                    delay = %humantime::format_duration(policy.delay),
                    "task failed, retrying: {}",
                    err.message
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(mut err) => {
                tracing::error!(task = name, attempt, "task failed: {}", err.message);
                err.add_context("task", name);
                err.add_context("attempts", &attempt.to_string());
                return Err(err);
            }
        }
    }
}
