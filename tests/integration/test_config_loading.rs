use dbtflow::core::config::ConfigLoader;
use dbtflow::core::types::ErrorCategory;
use dbtflow::core::warehouse::{PrivateKey, SnowflakeConnector};
use dbtflow::core::ConfigValidator;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn clear_dbtflow_env() {
    for v in &[
        "DBTFLOW_DBT_EXECUTABLE",
        "DBTFLOW_GIT_EXECUTABLE",
        "DBTFLOW_FAIL_ON_ERROR",
        "DBTFLOW_DBT_DIR",
        "DBTFLOW_DATA_DIR",
        "DBTFLOW_CONFIG_DIR",
        "DBTFLOW_RETRIES",
        "DBTFLOW_RETRY_DELAY",
        "IT_SNOWFLAKE_PASSWORD",
        "IT_SNOWFLAKE_TOKEN",
    ] {
        env::remove_var(v);
    }
}

const FULL_CONFIG: &str = r#"
[paths]
dbt_dir = "projects"
data_dir = "/var/lib/dbtflow"

[dbt]
executable = "/opt/venv/bin/dbt"
fail_on_error = false
timeout = "30m"

[retry]
retries = 3
delay = "250ms"

[connectors.tuva-snowflake-conn]
account = "xy12345"
user = "ANALYST"
password_env = "IT_SNOWFLAKE_PASSWORD"
role = "TRANSFORMER"
database = "TUVA"
warehouse = "COMPUTE_WH"
private_key_path = "/keys/rsa_key.p8"
token_env = "IT_SNOWFLAKE_TOKEN"
"#;

/// Test integration of config loading with environment variables
#[test]
#[serial]
fn test_config_loading_integration() {
    clear_dbtflow_env();
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("dbtflow.toml"), FULL_CONFIG).unwrap();

    let config = ConfigLoader::load_from_root(temp_dir.path()).unwrap();
    ConfigValidator::validate(&config).unwrap();

    assert_eq!(config.paths.dbt_dir, PathBuf::from("projects"));
    assert_eq!(config.paths.data_dir, PathBuf::from("/var/lib/dbtflow"));
    assert_eq!(config.paths.config_dir, PathBuf::from("config"));
    assert_eq!(config.dbt.executable, "/opt/venv/bin/dbt");
    assert!(!config.dbt.fail_on_error);
    assert_eq!(
        config.dbt.timeout().unwrap(),
        Some(Duration::from_secs(30 * 60))
    );
    assert_eq!(config.retry.delay().unwrap(), Duration::from_millis(250));
    assert_eq!(config.connectors.len(), 1);

    // environment wins over the file
    env::set_var("DBTFLOW_DBT_EXECUTABLE", "dbt-1.8");
    env::set_var("DBTFLOW_RETRIES", "0");
    env::set_var("DBTFLOW_FAIL_ON_ERROR", "true");
    let config = ConfigLoader::load_from_root(temp_dir.path()).unwrap();
    assert_eq!(config.dbt.executable, "dbt-1.8");
    assert_eq!(config.retry.retries, 0);
    assert!(config.dbt.fail_on_error);

    clear_dbtflow_env();
}

#[test]
#[serial]
fn test_explicit_config_path() {
    clear_dbtflow_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("elsewhere.toml");
    fs::write(&path, "[retry]\nretries = 7\n").unwrap();

    let config = ConfigLoader::load(&path).unwrap();
    assert_eq!(config.retry.retries, 7);
    assert_eq!(config.retry.delay, "5s");

    let missing = ConfigLoader::load(&temp_dir.path().join("missing.toml")).unwrap();
    assert_eq!(missing.retry.retries, 2);
}

#[test]
#[serial]
fn test_invalid_toml_is_validation_error() {
    clear_dbtflow_env();
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("dbtflow.toml"), "[retry\nretries = ").unwrap();

    let err = ConfigLoader::load_from_root(temp_dir.path()).unwrap_err();
    assert_eq!(err.category, ErrorCategory::ValidationError);
    assert!(err.message.contains("dbtflow.toml"));
}

#[test]
#[serial]
fn test_validator_rejects_bad_values() {
    clear_dbtflow_env();
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("dbtflow.toml"),
        "[retry]\nretries = 11\n",
    )
    .unwrap();
    let config = ConfigLoader::load_from_root(temp_dir.path()).unwrap();
    assert!(ConfigValidator::validate(&config).is_err());

    fs::write(
        temp_dir.path().join("dbtflow.toml"),
        "[retry]\ndelay = \"soon\"\n",
    )
    .unwrap();
    let config = ConfigLoader::load_from_root(temp_dir.path()).unwrap();
    assert!(ConfigValidator::validate(&config).is_err());
}

#[test]
#[serial]
fn test_connector_resolves_secrets_from_env() {
    clear_dbtflow_env();
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("dbtflow.toml"), FULL_CONFIG).unwrap();
    let config = ConfigLoader::load_from_root(temp_dir.path()).unwrap();

    assert!(SnowflakeConnector::load(&config, "tuva-snowflake-conn").is_err());

    env::set_var("IT_SNOWFLAKE_PASSWORD", "s3cret");
    env::set_var("IT_SNOWFLAKE_TOKEN", "pat-token");
    let connector = SnowflakeConnector::load(&config, "tuva-snowflake-conn").unwrap();
    clear_dbtflow_env();

    assert_eq!(connector.password.as_deref(), Some("s3cret"));
    assert_eq!(connector.token.as_deref(), Some("pat-token"));
    assert_eq!(connector.schema, "PUBLIC");
    assert_eq!(
        connector.private_key,
        Some(PrivateKey::Path(PathBuf::from("/keys/rsa_key.p8")))
    );
    assert_eq!(
        connector.host.as_str(),
        "https://xy12345.snowflakecomputing.com/"
    );

    let debug = format!("{:?}", connector);
    assert!(!debug.contains("s3cret"));
    assert!(!debug.contains("pat-token"));
}
