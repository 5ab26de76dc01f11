pub mod duckdb;
pub mod snowflake;

pub use self::duckdb::{TableCount, VerificationResults};
pub use self::snowflake::{
    PrivateKey, QueryResult, SnowflakeClient, SnowflakeConnector, SnowflakeError,
};
