use std::env;

/// Execution contexts that influence where console logs go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionContext {
    /// A person is watching the terminal.
    Interactive,
    /// Scheduled or scripted runs that should stay quiet on the console.
    Unattended,
}

impl ExecutionContext {
    /// Returns `true` when console sinks should be disabled.
    pub fn disables_console(self) -> bool {
        matches!(self, ExecutionContext::Unattended)
    }
}

/// `DBTFLOW_QUIET=1` marks the run as unattended; the log file still records everything.
pub fn detect_context() -> ExecutionContext {
    if quiet_override_enabled() {
        ExecutionContext::Unattended
    } else {
        ExecutionContext::Interactive
    }
}

fn quiet_override_enabled() -> bool {
    env::var("DBTFLOW_QUIET")
        .map(|value| value.trim() == "1")
        .unwrap_or(false)
}
