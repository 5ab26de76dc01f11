pub mod args;
pub mod commands;

pub use args::{DbtDemoArgs, HistoryArgs, SnowflakeDemoArgs, TuvaArgs, TuvaSnowflakeArgs};
use crate::core::flows::FlowRequest;
use crate::core::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
COMMANDS:\n{subcommands}\n";

const AFTER_LONG_HELP: &str = "\
Projects, databases and run records are kept under --root. Use `dbtflow flows` to list what can run.

ENVIRONMENT:
    DBTFLOW_DBT_EXECUTABLE   dbt executable (default: dbt)
    DBTFLOW_GIT_EXECUTABLE   git executable (default: git)
    DBTFLOW_FAIL_ON_ERROR    fail flows on non-zero dbt exits (default: true)
    DBTFLOW_DBT_DIR          project directory (default: dbt)
    DBTFLOW_DATA_DIR         DuckDB data directory (default: data)
    DBTFLOW_CONFIG_DIR       profiles directory (default: config)
    DBTFLOW_RETRIES          task retries (default: 2)
    DBTFLOW_RETRY_DELAY      delay between task retries (default: 5s)
    DBTFLOW_QUIET            set to 1 to silence console logs
    RUST_LOG                 log filter, overrides logging.default_level";

#[derive(Parser, Debug)]
#[command(name = "dbtflow")]
#[command(version = crate::VERSION)]
#[command(about = "Run dbt demo flows against DuckDB and Snowflake")]
#[command(help_template = HELP_TEMPLATE)]
#[command(after_long_help = AFTER_LONG_HELP)]
pub struct Args {
    /// Directory that holds dbt/, data/, config/ and .dbtflow/
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Config file to use instead of <root>/dbtflow.toml
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// How results are printed
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(about = "List available flows")]
    Flows,
    #[command(
        about = "Run the smoke-test flow",
        after_help = "Example:\n    dbtflow hello"
    )]
    Hello,
    #[command(
        about = "Build the dbt demo project into DuckDB",
        long_about = "Downloads the demo project archive, writes a DuckDB profile and runs dbt deps, seed, run and test.",
        after_help = "Example:\n    dbtflow dbt-demo --allow-dbt-failures"
    )]
    DbtDemo(DbtDemoArgs),
    #[command(
        about = "Build the Tuva Health demo into DuckDB",
        long_about = "Clones the Tuva demo, creates the DuckDB file, writes profiles, runs dbt and reports row counts per table.",
        after_help = "Example:\n    dbtflow tuva --db-path data/tuva.duckdb"
    )]
    Tuva(TuvaArgs),
    #[command(
        about = "Check a Snowflake connector with sample queries",
        after_help = "Example:\n    dbtflow snowflake-demo --connector tuva-snowflake-conn"
    )]
    SnowflakeDemo(SnowflakeDemoArgs),
    #[command(
        about = "Build the Tuva Health demo into Snowflake",
        long_about = "Tests the connector, clones the Tuva demo, writes a Snowflake profile and runs dbt run and test.",
        after_help = "Example:\n    dbtflow tuva-snowflake --connector tuva-snowflake-conn"
    )]
    TuvaSnowflake(TuvaSnowflakeArgs),
    #[command(
        about = "Show recorded flow runs",
        after_help = "Example:\n    dbtflow history --limit 5 --format json"
    )]
    History(HistoryArgs),
}

impl Command {
    /// The flow this command runs, if any.
    pub fn flow_request(&self) -> Option<FlowRequest> {
        match self {
            Command::Hello => Some(FlowRequest::Hello),
            Command::DbtDemo(args) => Some(FlowRequest::DbtDemo(args.clone().into())),
            Command::Tuva(args) => Some(FlowRequest::Tuva(args.clone().into())),
            Command::SnowflakeDemo(args) => Some(FlowRequest::SnowflakeDemo(args.clone().into())),
            Command::TuvaSnowflake(args) => Some(FlowRequest::TuvaSnowflake(args.clone().into())),
            Command::Flows | Command::History(_) => None,
        }
    }
}

pub async fn run(args: Args) -> crate::Result<()> {
    match &args.command {
        Command::Flows => commands::flows(&args),
        Command::History(history_args) => commands::history(&args, history_args),
        command => match command.flow_request() {
            Some(request) => commands::run_flow(&args, request).await,
            None => Ok(()),
        },
    }
}
