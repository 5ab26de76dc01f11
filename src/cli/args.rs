use crate::core::flows::dbt_demo::DEFAULT_REPO_ZIP;
use crate::core::flows::snowflake_demo::DEFAULT_CONNECTOR;
use crate::core::flows::tuva::DEFAULT_REPO_URL;
use crate::core::flows::{DbtDemoOptions, SnowflakeDemoOptions, TuvaOptions, TuvaSnowflakeOptions};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct DbtDemoArgs {
    /// Zip archive containing the dbt demo project
    #[arg(long, value_name = "URL", default_value = DEFAULT_REPO_ZIP)]
    pub zip_url: String,

    /// Keep going when a dbt command exits non-zero
    #[arg(long)]
    pub allow_dbt_failures: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TuvaArgs {
    /// Git repository holding the Tuva demo project
    #[arg(long, value_name = "URL", default_value = DEFAULT_REPO_URL)]
    pub repo_url: String,

    /// Clone destination (default: <dbt_dir>/tuva_demo)
    #[arg(long, value_name = "DIR")]
    pub target_dir: Option<PathBuf>,

    /// DuckDB file to build into (default: <data_dir>/tuva_demo.duckdb)
    #[arg(long, value_name = "FILE")]
    pub db_path: Option<PathBuf>,

    /// Keep going when a dbt command exits non-zero
    #[arg(long)]
    pub allow_dbt_failures: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SnowflakeDemoArgs {
    /// Connector block in dbtflow.toml
    #[arg(long, value_name = "NAME", default_value = DEFAULT_CONNECTOR)]
    pub connector: String,
}

#[derive(Args, Debug, Clone)]
pub struct TuvaSnowflakeArgs {
    /// Git repository holding the Tuva demo project
    #[arg(long, value_name = "URL", default_value = DEFAULT_REPO_URL)]
    pub repo_url: String,

    /// Connector block in dbtflow.toml
    #[arg(long, value_name = "NAME", default_value = DEFAULT_CONNECTOR)]
    pub connector: String,

    /// Clone destination (default: <dbt_dir>/tuva_snowflake_demo)
    #[arg(long, value_name = "DIR")]
    pub target_dir: Option<PathBuf>,

    /// Keep going when a dbt command exits non-zero
    #[arg(long)]
    pub allow_dbt_failures: bool,
}

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Show at most this many runs, newest first
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

impl From<DbtDemoArgs> for DbtDemoOptions {
    fn from(args: DbtDemoArgs) -> Self {
        DbtDemoOptions {
            zip_url: args.zip_url,
            allow_dbt_failures: args.allow_dbt_failures,
        }
    }
}

impl From<TuvaArgs> for TuvaOptions {
    fn from(args: TuvaArgs) -> Self {
        TuvaOptions {
            repo_url: args.repo_url,
            target_dir: args.target_dir,
            db_path: args.db_path,
            allow_dbt_failures: args.allow_dbt_failures,
        }
    }
}

impl From<SnowflakeDemoArgs> for SnowflakeDemoOptions {
    fn from(args: SnowflakeDemoArgs) -> Self {
        SnowflakeDemoOptions {
            connector: args.connector,
        }
    }
}

impl From<TuvaSnowflakeArgs> for TuvaSnowflakeOptions {
    fn from(args: TuvaSnowflakeArgs) -> Self {
        TuvaSnowflakeOptions {
            repo_url: args.repo_url,
            connector: args.connector,
            target_dir: args.target_dir,
            allow_dbt_failures: args.allow_dbt_failures,
        }
    }
}
