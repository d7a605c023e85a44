//! Embedded `DuckDB` backend.

use std::path::{Path, PathBuf};

use ::duckdb::{Config, Connection, ToSql};
use tracing::debug;

use crate::{BackendKind, Cursor, QueryOutcome, WarehouseConnection, WarehouseError};

/// Access mode for database connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Read-only access.
    ReadOnly,
    /// Read-write access.
    #[default]
    ReadWrite,
}

/// Where and how to open the embedded database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuckDbConfig {
    /// Database file. `None` opens a private in-memory database.
    pub db_path: Option<PathBuf>,
    /// Only honored for file databases.
    pub access_mode: AccessMode,
}

/// A single embedded `DuckDB` connection.
pub struct DuckDbConnection {
    connection: Connection,
    db_path: Option<PathBuf>,
}

impl DuckDbConnection {
    /// Open the configured database.
    ///
    /// # Errors
    /// Returns an error if the database file cannot be opened or configured.
    pub fn open(config: &DuckDbConfig) -> Result<Self, WarehouseError> {
        let connection = match config.db_path.as_deref() {
            Some(path) => open_file(path, config.access_mode)?,
            None => Connection::open_in_memory()?,
        };
        configure_connection(&connection)?;

        debug!(
            db_path = ?config.db_path,
            access_mode = ?config.access_mode,
            "opened duckdb connection"
        );

        Ok(Self {
            connection,
            db_path: config.db_path.clone(),
        })
    }

    /// Get the path to the database file, if any.
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Run setup statements outside of any benchmark timing.
    ///
    /// # Errors
    /// Returns an error if any statement in the batch fails.
    pub fn execute_batch(&self, sql: &str) -> Result<(), WarehouseError> {
        self.connection.execute_batch(sql)?;
        Ok(())
    }
}

impl WarehouseConnection for DuckDbConnection {
    fn kind(&self) -> BackendKind {
        BackendKind::DuckDb
    }

    fn cursor(&mut self) -> Result<Box<dyn Cursor + '_>, WarehouseError> {
        Ok(Box::new(DuckDbCursor {
            connection: &self.connection,
        }))
    }

    fn close(self: Box<Self>) -> Result<(), WarehouseError> {
        self.connection
            .close()
            .map_err(|(_, error)| WarehouseError::DuckDb(error))
    }
}

struct DuckDbCursor<'conn> {
    connection: &'conn Connection,
}

impl Cursor for DuckDbCursor<'_> {
    fn execute(&mut self, sql: &str) -> Result<QueryOutcome, WarehouseError> {
        let mut statement = self.connection.prepare(sql)?;
        let mut rows = statement.query([] as [&dyn ToSql; 0])?;

        // Results stream lazily; draining them is what completes the statement.
        let mut row_count = 0_u64;
        while rows.next()?.is_some() {
            row_count += 1;
        }

        Ok(QueryOutcome {
            row_count,
            query_id: None,
        })
    }
}

fn open_file(path: &Path, mode: AccessMode) -> Result<Connection, ::duckdb::Error> {
    let config = match mode {
        AccessMode::ReadOnly => Config::default().access_mode(::duckdb::AccessMode::ReadOnly)?,
        AccessMode::ReadWrite => Config::default(),
    };
    Connection::open_with_flags(path, config)
}

fn configure_connection(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch("PRAGMA disable_progress_bar;")
}
