use serde::{Deserialize, Serialize};

/// Outcome of a recorded flow run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RunStatus {
    #[default]
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    ValidationError,
    ToolExecutionError,
    TimeoutError,
    NetworkError,
    WarehouseError,
    WorkspaceError,
    SerializationError,
    IoError,
    InternalError,
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error severity enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Error,
    Warning,
    Info,
    Debug,
}

/// The demo flows shipped with dbtflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowKind {
    Hello,
    DbtDemo,
    Tuva,
    SnowflakeDemo,
    TuvaSnowflake,
}

impl FlowKind {
    pub const ALL: [FlowKind; 5] = [
        FlowKind::Hello,
        FlowKind::DbtDemo,
        FlowKind::Tuva,
        FlowKind::SnowflakeDemo,
        FlowKind::TuvaSnowflake,
    ];

    /// Identifier used on the command line and in run records.
    pub fn slug(self) -> &'static str {
        match self {
            FlowKind::Hello => "hello",
            FlowKind::DbtDemo => "dbt-demo",
            FlowKind::Tuva => "tuva",
            FlowKind::SnowflakeDemo => "snowflake-demo",
            FlowKind::TuvaSnowflake => "tuva-snowflake",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            FlowKind::Hello => "basic-test-flow",
            FlowKind::DbtDemo => "dbt Demo",
            FlowKind::Tuva => "Tuva Health Demo",
            FlowKind::SnowflakeDemo => "Snowflake Demo",
            FlowKind::TuvaSnowflake => "Tuva Health with Snowflake",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FlowKind::Hello => "Smoke test that runs a single task and exits",
            FlowKind::DbtDemo => {
                "Download the dbt demo project archive and build it into data/demo.duckdb"
            }
            FlowKind::Tuva => {
                "Clone the Tuva Health demo, build it into DuckDB, and count rows per table"
            }
            FlowKind::SnowflakeDemo => {
                "Check a Snowflake connector and run a few sample queries through the SQL API"
            }
            FlowKind::TuvaSnowflake => "Clone the Tuva Health demo and build it into Snowflake",
        }
    }
}

impl std::fmt::Display for FlowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}
