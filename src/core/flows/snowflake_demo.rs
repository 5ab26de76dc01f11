#![allow(clippy::result_large_err)]

use super::{with_troubleshooting, FlowContext};
use crate::core::error::AppError;
use crate::core::task::{run_task, TaskPolicy};
use crate::core::warehouse::{QueryResult, SnowflakeClient};
use serde::Serialize;

pub const DEFAULT_CONNECTOR: &str = "tuva-snowflake-conn";

const CONNECTION_SQL: &str = "SELECT CURRENT_TIMESTAMP(), CURRENT_USER()";

const SAMPLE_SQL: &str = "
SELECT
    'Sample Data' as source,
    CURRENT_TIMESTAMP() as query_time,
    1 as test_value
UNION ALL
SELECT
    'More Sample Data' as source,
    CURRENT_TIMESTAMP() as query_time,
    2 as test_value
";

const FRAME_SQL: &str = "
SELECT
    'DataFrame Test' as description,
    CURRENT_DATE() as date_col,
    RANDOM() as random_value,
    ROW_NUMBER() OVER (ORDER BY RANDOM()) as row_num
FROM TABLE(GENERATOR(ROWCOUNT=>5))
";

#[derive(Debug, Clone)]
pub struct SnowflakeDemoOptions {
    pub connector: String,
}

impl Default for SnowflakeDemoOptions {
    fn default() -> Self {
        SnowflakeDemoOptions {
            connector: DEFAULT_CONNECTOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionTest {
    pub current_timestamp: Option<String>,
    pub current_user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameSummary {
    pub shape: (usize, usize),
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnowflakeDemoResult {
    pub connection_test: ConnectionTest,
    pub query_results: QueryResult,
    pub frame_shape: (usize, usize),
    pub frame_columns: Vec<String>,
}

pub fn troubleshooting_tips(connector: &str) -> Vec<String> {
    vec![
        "Ensure the Snowflake SQL API is reachable and token_env is set for the connector"
            .to_string(),
        format!(
            "Verify connector '{}' exists in dbtflow.toml and is configured",
            connector
        ),
        "Check network connectivity to Snowflake".to_string(),
        "Verify your Snowflake account permissions".to_string(),
    ]
}

async fn test_snowflake_connection(client: &SnowflakeClient) -> Result<ConnectionTest, AppError> {
    let mut row = client.fetch_one(CONNECTION_SQL).await?.into_iter();
    tracing::info!("Successfully connected to Snowflake!");
    let test = ConnectionTest {
        current_timestamp: row.next().flatten(),
        current_user: row.next().flatten(),
    };
    tracing::info!("Current timestamp: {}", test.current_timestamp.as_deref().unwrap_or("-"));
    tracing::info!("Current user: {}", test.current_user.as_deref().unwrap_or("-"));
    Ok(test)
}

async fn run_sample_query(client: &SnowflakeClient) -> Result<QueryResult, AppError> {
    tracing::info!("Running sample query...");
    let results = client.fetch_all(SAMPLE_SQL).await?;
    tracing::info!("Query returned {} rows:", results.rows.len());
    for row in &results.rows {
        tracing::info!("  {:?}", row);
    }
    Ok(results)
}

async fn query_to_frame(client: &SnowflakeClient) -> Result<FrameSummary, AppError> {
    tracing::info!("Querying generated rows into a frame...");
    let frame = client.fetch_all(FRAME_SQL).await?;
    tracing::info!("Frame columns: {}", frame.columns.join(", "));
    for row in &frame.rows {
        tracing::info!("  {:?}", row);
    }
    tracing::info!("Frame shape: {:?}", frame.shape());
    Ok(FrameSummary {
        shape: frame.shape(),
        columns: frame.columns,
    })
}

/// Check a connector and run a few read-only queries through it.
pub async fn snowflake_demo_flow(
    ctx: &FlowContext,
    options: &SnowflakeDemoOptions,
) -> Result<SnowflakeDemoResult, AppError> {
    tracing::info!(
        "Starting Snowflake demo using connector: {}",
        options.connector
    );

    let outcome = async {
        let client = ctx.snowflake_client(&options.connector)?;
        let client = &client;
        let policy = TaskPolicy::once();

        let connection_test = run_task("test_snowflake_connection", policy, move || {
            test_snowflake_connection(client)
        })
        .await?;
        let query_results =
            run_task("run_sample_query", policy, move || run_sample_query(client)).await?;
        let frame = run_task("query_to_frame", policy, move || query_to_frame(client)).await?;

        tracing::info!("All Snowflake operations completed successfully!");
        Ok::<_, AppError>(SnowflakeDemoResult {
            connection_test,
            query_results,
            frame_shape: frame.shape,
            frame_columns: frame.columns,
        })
    }
    .await;

    outcome.map_err(|err| {
        with_troubleshooting(
            err,
            "Snowflake demo",
            &troubleshooting_tips(&options.connector),
        )
    })
}
