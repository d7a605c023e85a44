//! # uwbench Warehouse
//!
//! Connection layer used by the benchmark runner.
//!
//! ## Overview
//!
//! The runner only needs three things from a warehouse: open a cursor, execute
//! a statement to completion, and release the connection. Those are captured by
//! [`WarehouseConnection`] and [`Cursor`], with two backends behind them:
//!
//! | Backend | Transport | Use |
//! |---------|-----------|-----|
//! | [`SnowflakeConnection`] | HTTPS session + query endpoints | Production benchmark target |
//! | [`DuckDbConnection`] | Embedded engine | Local catalogs, tests |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use uwbench_warehouse::{connect, BackendConfig, DuckDbConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut connection = connect(&BackendConfig::DuckDb(DuckDbConfig::default()))?;
//!
//!     {
//!         let mut cursor = connection.cursor()?;
//!         let outcome = cursor.execute("SELECT 42")?;
//!         println!("{} row(s)", outcome.row_count);
//!     }
//!
//!     connection.close()?;
//!     Ok(())
//! }
//! ```

pub mod duckdb;
pub mod http;
pub mod snowflake;

use std::fmt::{Display, Formatter};

use thiserror::Error;

pub use duckdb::{AccessMode, DuckDbConfig, DuckDbConnection};
pub use http::{HttpError, HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use snowflake::{SnowflakeConfig, SnowflakeConnection};

/// Errors that can occur while talking to a warehouse.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` engine error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// Transport failure (DNS, TLS, connect, non-2xx status).
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The warehouse rejected the login.
    #[error("authentication failed{}: {message}", code_suffix(.code, &None))]
    Authentication {
        code: Option<String>,
        message: String,
    },

    /// The warehouse reported a statement failure.
    #[error("SQL execution failed{}: {message}", code_suffix(.code, .sql_state))]
    QueryFailed {
        code: Option<String>,
        sql_state: Option<String>,
        message: String,
        query_id: Option<String>,
    },

    /// The warehouse answered with a payload we could not interpret.
    #[error("unexpected warehouse response: {0}")]
    Protocol(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

fn code_suffix(code: &Option<String>, sql_state: &Option<String>) -> String {
    match (code, sql_state) {
        (Some(code), Some(state)) => format!(" (code {code}, state {state})"),
        (Some(code), None) => format!(" (code {code})"),
        (None, Some(state)) => format!(" (state {state})"),
        (None, None) => String::new(),
    }
}

/// Supported warehouse backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Snowflake,
    DuckDb,
}

impl BackendKind {
    /// Stable lowercase identifier used in configuration and JSON output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Snowflake => "snowflake",
            Self::DuckDb => "duckdb",
        }
    }

    /// Parses a configuration value, ignoring ASCII case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "snowflake" => Some(Self::Snowflake),
            "duckdb" => Some(Self::DuckDb),
            _ => None,
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Snowflake => f.write_str("Snowflake"),
            Self::DuckDb => f.write_str("DuckDB"),
        }
    }
}

/// Connection settings for one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Snowflake(SnowflakeConfig),
    DuckDb(DuckDbConfig),
}

impl BackendConfig {
    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::Snowflake(_) => BackendKind::Snowflake,
            Self::DuckDb(_) => BackendKind::DuckDb,
        }
    }
}

/// What the warehouse reported after a statement completed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOutcome {
    pub row_count: u64,
    pub query_id: Option<String>,
}

/// Per-statement execution handle.
///
/// A cursor is released when it is dropped.
pub trait Cursor {
    /// Submits `sql` and blocks until the warehouse reports completion.
    fn execute(&mut self, sql: &str) -> Result<QueryOutcome, WarehouseError>;
}

/// An open warehouse session.
pub trait WarehouseConnection {
    fn kind(&self) -> BackendKind;

    /// Opens a cursor bound to this connection.
    fn cursor(&mut self) -> Result<Box<dyn Cursor + '_>, WarehouseError>;

    /// Releases the connection and any server-side session.
    fn close(self: Box<Self>) -> Result<(), WarehouseError>;
}

/// Opens a connection to the configured backend.
pub fn connect(config: &BackendConfig) -> Result<Box<dyn WarehouseConnection>, WarehouseError> {
    match config {
        BackendConfig::Snowflake(config) => Ok(Box::new(SnowflakeConnection::connect(config)?)),
        BackendConfig::DuckDb(config) => Ok(Box::new(DuckDbConnection::open(config)?)),
    }
}
