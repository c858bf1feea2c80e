//! Database connection management with pragma configuration.
//!
//! Opens the SQLite database, applies pragmas for durability and concurrent
//! readers (WAL mode), and runs migrations.

use super::migrations;
use crate::store::StoreError;
use std::path::Path;
use tokio_rusqlite::Connection;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;";

/// SQLite database handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread. Clones share the same connection.
#[derive(Clone, Debug)]
pub struct SqliteDb {
    pub(crate) conn: Connection,
}

impl SqliteDb {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        tracing::debug!(path = %path.display(), "opening SQLite database");
        let conn = Connection::open(&path)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))?;
        Self::init(conn).await
    }

    /// Open an in-memory database for testing.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.call(|conn| conn.execute_batch(PRAGMAS))
            .await
            .map_err(StoreError::from)?;

        migrations::run(&conn).await?;

        Ok(Self { conn })
    }
}
