//! Durable store: the append-only system of record for results.
//!
//! Every accepted write becomes exactly one immutable row in
//! `inference_results`. Rows are never updated or deleted.

mod postgres;

use async_trait::async_trait;
use tokio_rusqlite::rusqlite;

use crate::record::ResultRecord;

pub use postgres::{PgConfig, PostgresStore};

/// Errors from a durable store. Any of these aborts the write path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The database could not be reached or the connection was closed.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The insert violated a table constraint or trigger.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The transaction failed to commit.
    #[error("commit failed: {0}")]
    Commit(String),

    /// The payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Migration failed to apply.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Any other database failure.
    #[error("database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match &err {
            rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
                StoreError::Constraint(err.to_string())
            }
            rusqlite::Error::SqliteFailure(e, _)
                if matches!(
                    e.code,
                    ErrorCode::CannotOpen | ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
                ) =>
            {
                StoreError::Unavailable(err.to_string())
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

impl From<tokio_rusqlite::Error<StoreError>> for StoreError {
    fn from(err: tokio_rusqlite::Error<StoreError>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => StoreError::Unavailable("connection closed".into()),
            tokio_rusqlite::Error::Close(_) => StoreError::Unavailable("connection failed to close".into()),
            _ => StoreError::Unavailable("connection closed".into()),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for StoreError {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e.into(),
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// An append-only relational table of results.
///
/// Implementations run each insert inside its own transaction with an explicit
/// commit. A failed insert or commit leaves no row visible to other readers.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Append one row for `record` and return its auto-assigned id.
    async fn insert(&self, record: &ResultRecord) -> Result<i64, StoreError>;

    /// Short backend name used in logs.
    fn name(&self) -> &'static str;
}
