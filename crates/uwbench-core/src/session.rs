//! Scoped ownership of the run's single warehouse connection.

use tracing::{debug, warn};
use uwbench_warehouse::{connect, BackendConfig, BackendKind, WarehouseConnection, WarehouseError};

/// Owns one open connection and releases it exactly once.
///
/// Call [`Session::close`] to observe close errors. A session dropped on an
/// early return or unwind closes its connection from `Drop` and logs any
/// failure instead.
pub struct Session {
    kind: BackendKind,
    connection: Option<Box<dyn WarehouseConnection>>,
}

impl Session {
    /// Connect to the configured backend.
    pub fn open(config: &BackendConfig) -> Result<Self, WarehouseError> {
        Ok(Self::from_connection(connect(config)?))
    }

    pub fn from_connection(connection: Box<dyn WarehouseConnection>) -> Self {
        Self {
            kind: connection.kind(),
            connection: Some(connection),
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// The open connection.
    ///
    /// # Panics
    /// Never in practice: the connection is only taken by `close` and `drop`,
    /// both of which consume the session.
    pub fn connection(&mut self) -> &mut dyn WarehouseConnection {
        self.connection
            .as_deref_mut()
            .expect("session connection already released")
    }

    pub fn close(mut self) -> Result<(), WarehouseError> {
        match self.connection.take() {
            Some(connection) => {
                debug!(backend = %self.kind, "closing warehouse connection");
                connection.close()
            }
            None => Ok(()),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };

        if let Err(error) = connection.close() {
            warn!(backend = %self.kind, %error, "failed to close warehouse connection");
        }
    }
}
