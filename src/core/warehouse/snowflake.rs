#![allow(clippy::result_large_err)]

//! Snowflake access through the SQL API v2.
//!
//! A [`SnowflakeConnector`] is the resolved form of a `[connectors.<name>]`
//! block: secrets are read from the environment at load time and never
//! printed. [`SnowflakeClient`] submits statements and waits for them.

use crate::core::config::{ConnectorConfig, DbtflowConfig};
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const STATEMENT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_MAX_POLLS: u32 = 120;

#[derive(Debug, Error)]
pub enum SnowflakeError {
    #[error("connector '{0}' is not configured")]
    UnknownConnector(String),

    #[error("environment variable {var} referenced by connector '{connector}' is not set")]
    MissingSecret { connector: String, var: String },

    #[error("connector '{0}' has no token_env; the SQL API needs a token")]
    MissingToken(String),

    #[error("invalid Snowflake host '{host}': {source}")]
    InvalidHost {
        host: String,
        source: url::ParseError,
    },

    #[error("request to Snowflake failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Snowflake returned HTTP {status}: {message} (code {code})")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("statement {handle} still running after {polls} polls")]
    StillRunning { handle: String, polls: u32 },

    #[error("query returned no rows")]
    NoRows,

    #[error("unexpected response from Snowflake: {0}")]
    InvalidResponse(String),
}

impl From<SnowflakeError> for AppError {
    fn from(err: SnowflakeError) -> Self {
        let (category, code) = match &err {
            SnowflakeError::UnknownConnector(_)
            | SnowflakeError::MissingSecret { .. }
            | SnowflakeError::MissingToken(_)
            | SnowflakeError::InvalidHost { .. } => (ErrorCategory::ValidationError, "SF-001"),
            SnowflakeError::Http(_) => (ErrorCategory::NetworkError, "SF-002"),
            SnowflakeError::StillRunning { .. } => (ErrorCategory::TimeoutError, "SF-003"),
            SnowflakeError::Api { .. }
            | SnowflakeError::NoRows
            | SnowflakeError::InvalidResponse(_) => (ErrorCategory::WarehouseError, "SF-004"),
        };
        AppError::new(category, err.to_string()).with_code(code)
    }
}

/// Key material for key-pair authentication.
#[derive(Clone, PartialEq, Eq)]
pub enum PrivateKey {
    /// A key file dbt reads itself.
    Path(PathBuf),
    /// PEM text taken from the environment; written to disk before dbt runs.
    Inline(String),
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrivateKey::Path(path) => f.debug_tuple("Path").field(path).finish(),
            PrivateKey::Inline(_) => f.write_str("Inline(<redacted>)"),
        }
    }
}

#[derive(Clone)]
pub struct SnowflakeConnector {
    pub name: String,
    pub account: String,
    pub user: String,
    pub database: String,
    pub warehouse: String,
    pub schema: String,
    pub role: Option<String>,
    pub authenticator: String,
    pub password: Option<String>,
    pub private_key: Option<PrivateKey>,
    pub private_key_passphrase: Option<String>,
    pub token: Option<String>,
    pub token_type: String,
    pub host: Url,
}

impl std::fmt::Debug for SnowflakeConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |set: bool| if set { "<redacted>" } else { "<unset>" };
        f.debug_struct("SnowflakeConnector")
            .field("name", &self.name)
            .field("account", &self.account)
            .field("user", &self.user)
            .field("database", &self.database)
            .field("warehouse", &self.warehouse)
            .field("schema", &self.schema)
            .field("role", &self.role)
            .field("authenticator", &self.authenticator)
            .field("password", &redact(self.password.is_some()))
            .field("private_key", &self.private_key)
            .field(
                "private_key_passphrase",
                &redact(self.private_key_passphrase.is_some()),
            )
            .field("token", &redact(self.token.is_some()))
            .field("host", &self.host.as_str())
            .finish()
    }
}

impl SnowflakeConnector {
    /// Resolve the connector called `name` from config and environment.
    pub fn load(config: &DbtflowConfig, name: &str) -> Result<Self, SnowflakeError> {
        let block = config
            .connectors
            .get(name)
            .ok_or_else(|| SnowflakeError::UnknownConnector(name.to_string()))?;
        Self::from_config(name, block)
    }

    pub fn from_config(name: &str, block: &ConnectorConfig) -> Result<Self, SnowflakeError> {
        let secret = |var: &Option<String>| -> Result<Option<String>, SnowflakeError> {
            match var {
                None => Ok(None),
                Some(var) => std::env::var(var).map(Some).map_err(|_| {
                    SnowflakeError::MissingSecret {
                        connector: name.to_string(),
                        var: var.clone(),
                    }
                }),
            }
        };

        let private_key = match (&block.private_key_path, secret(&block.private_key_env)?) {
            (Some(path), _) => Some(PrivateKey::Path(path.clone())),
            (None, Some(pem)) => Some(PrivateKey::Inline(pem)),
            (None, None) => None,
        };

        let raw_host = block
            .host
            .clone()
            .unwrap_or_else(|| format!("https://{}.snowflakecomputing.com", block.account));
        let host = Url::parse(&raw_host).map_err(|source| SnowflakeError::InvalidHost {
            host: raw_host.clone(),
            source,
        })?;

        Ok(SnowflakeConnector {
            name: name.to_string(),
            account: block.account.clone(),
            user: block.user.clone(),
            database: block.database.clone(),
            warehouse: block.warehouse.clone(),
            schema: block.schema.clone(),
            role: block.role.clone(),
            authenticator: block.authenticator.clone(),
            password: secret(&block.password_env)?,
            private_key,
            private_key_passphrase: secret(&block.private_key_passphrase_env)?,
            token: secret(&block.token_env)?,
            token_type: block.token_type.clone(),
            host,
        })
    }
}

/// Column names plus stringly-typed rows, as the SQL API returns them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryResult {
    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }
}

#[derive(Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    timeout: u64,
    database: &'a str,
    schema: &'a str,
    warehouse: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    statement_handle: Option<String>,
    #[serde(default)]
    result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    data: Option<Vec<Vec<Option<String>>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetaData {
    #[serde(default)]
    row_type: Vec<ColumnType>,
}

#[derive(Debug, Deserialize)]
struct ColumnType {
    name: String,
}

impl StatementResponse {
    fn into_result(self) -> QueryResult {
        QueryResult {
            columns: self
                .result_set_meta_data
                .map(|meta| meta.row_type.into_iter().map(|c| c.name).collect())
                .unwrap_or_default(),
            rows: self.data.unwrap_or_default(),
        }
    }
}

pub struct SnowflakeClient {
    http: reqwest::Client,
    connector: SnowflakeConnector,
    token: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl SnowflakeClient {
    pub fn new(http: reqwest::Client, connector: SnowflakeConnector) -> Result<Self, SnowflakeError> {
        let token = connector
            .token
            .clone()
            .ok_or_else(|| SnowflakeError::MissingToken(connector.name.clone()))?;
        Ok(SnowflakeClient {
            http,
            connector,
            token,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Upper bound on status polls for a statement answered with HTTP 202.
    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = max_polls;
        self
    }

    pub fn connector(&self) -> &SnowflakeConnector {
        &self.connector
    }

    fn statements_url(&self) -> String {
        format!(
            "{}/api/v2/statements",
            self.connector.host.as_str().trim_end_matches('/')
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header(
                "X-Snowflake-Authorization-Token-Type",
                &self.connector.token_type,
            )
            .header(reqwest::header::ACCEPT, "application/json")
            .header(
                reqwest::header::USER_AGENT,
                concat!("dbtflow/", env!("CARGO_PKG_VERSION")),
            )
    }

    pub async fn fetch_all(&self, sql: &str) -> Result<QueryResult, SnowflakeError> {
        let body = StatementRequest {
            statement: sql,
            timeout: STATEMENT_TIMEOUT_SECS,
            database: &self.connector.database,
            schema: &self.connector.schema,
            warehouse: &self.connector.warehouse,
            role: self.connector.role.as_deref(),
        };
        tracing::debug!(connector = %self.connector.name, "submitting statement");

        let response = self
            .authorize(self.http.post(self.statements_url()))
            .json(&body)
            .send()
            .await?;

        let (status, parsed) = read_response(response).await?;
        match status {
            StatusCode::OK => Ok(parsed.into_result()),
            StatusCode::ACCEPTED => {
                let handle = parsed.statement_handle.ok_or_else(|| {
                    SnowflakeError::InvalidResponse("202 without statementHandle".to_string())
                })?;
                self.wait_for(&handle).await
            }
            other => Err(api_error(other, parsed)),
        }
    }

    pub async fn fetch_one(&self, sql: &str) -> Result<Vec<Option<String>>, SnowflakeError> {
        let result = self.fetch_all(sql).await?;
        result.rows.into_iter().next().ok_or(SnowflakeError::NoRows)
    }

    async fn wait_for(&self, handle: &str) -> Result<QueryResult, SnowflakeError> {
        let url = format!("{}/{}", self.statements_url(), handle);
        for poll in 1..=self.max_polls {
            tokio::time::sleep(self.poll_interval).await;
            tracing::debug!(handle, poll, "polling statement status");

            let response = self.authorize(self.http.get(&url)).send().await?;
            let (status, parsed) = read_response(response).await?;
            match status {
                StatusCode::OK => return Ok(parsed.into_result()),
                StatusCode::ACCEPTED => continue,
                other => return Err(api_error(other, parsed)),
            }
        }

        Err(SnowflakeError::StillRunning {
            handle: handle.to_string(),
            polls: self.max_polls,
        })
    }
}

async fn read_response(
    response: reqwest::Response,
) -> Result<(StatusCode, StatementResponse), SnowflakeError> {
    let status = response.status();
    let text = response.text().await?;
    match serde_json::from_str::<StatementResponse>(&text) {
        Ok(parsed) => Ok((status, parsed)),
        Err(_) if !status.is_success() => Ok((
            status,
            StatementResponse {
                code: None,
                message: Some(text.trim().to_string()).filter(|m| !m.is_empty()),
                statement_handle: None,
                result_set_meta_data: None,
                data: None,
            },
        )),
        Err(e) => Err(SnowflakeError::InvalidResponse(e.to_string())),
    }
}

fn api_error(status: StatusCode, parsed: StatementResponse) -> SnowflakeError {
    SnowflakeError::Api {
        status: status.as_u16(),
        code: parsed.code.unwrap_or_else(|| "unknown".to_string()),
        message: parsed
            .message
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
    }
}
