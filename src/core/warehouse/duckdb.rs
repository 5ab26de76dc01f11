#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::core::workspace::ensure_dir;
use duckdb::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Row count for one table, or the error text when counting failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableCount {
    Rows(i64),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResults {
    pub tables_created: usize,
    pub table_list: Vec<String>,
    pub table_counts: BTreeMap<String, TableCount>,
}

fn open(path: &Path) -> Result<Connection, AppError> {
    Connection::open(path).map_err(|e| {
        AppError::with_source(
            ErrorCategory::WarehouseError,
            format!("failed to open DuckDB database {}", path.display()),
            e,
        )
        .with_code("DUCKDB-001")
    })
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Create (or open) the database file so it exists before dbt runs.
pub fn create_database(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let conn = open(path)?;
    drop(conn);
    tracing::info!("Database file created at {}", path.display());
    Ok(())
}

/// List tables and count rows in each. A failing count is recorded against
/// its table and does not abort the scan.
pub fn verify_database(path: &Path) -> Result<VerificationResults, AppError> {
    let conn = open(path)?;
    let query_error = |e: duckdb::Error| {
        AppError::with_source(ErrorCategory::WarehouseError, "failed to list tables", e)
            .with_code("DUCKDB-002")
    };

    let mut statement = conn.prepare("SHOW TABLES").map_err(query_error)?;
    let tables = statement
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(query_error)?
        .collect::<Result<Vec<String>, _>>()
        .map_err(query_error)?;

    let mut table_counts = BTreeMap::new();
    for table in &tables {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table));
        let count = match conn.query_row(&sql, [], |row| row.get::<_, i64>(0)) {
            Ok(rows) => TableCount::Rows(rows),
            Err(e) => {
                tracing::warn!(table = %table, "row count failed: {}", e);
                TableCount::Error(format!("Error: {}", e))
            }
        };
        table_counts.insert(table.clone(), count);
    }

    let results = VerificationResults {
        tables_created: tables.len(),
        table_list: tables,
        table_counts,
    };
    tracing::info!(tables = results.tables_created, "Verification results: {:?}", results);
    Ok(results)
}

pub async fn create_database_blocking(path: PathBuf) -> Result<(), AppError> {
    tokio::task::spawn_blocking(move || create_database(&path)).await?
}

pub async fn verify_database_blocking(path: PathBuf) -> Result<VerificationResults, AppError> {
    tokio::task::spawn_blocking(move || verify_database(&path)).await?
}
