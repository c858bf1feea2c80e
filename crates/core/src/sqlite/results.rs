//! Append-only result rows.
//!
//! Inserts run inside an explicit transaction; reads exist for inspection
//! and tests. There is no update or delete path.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

use super::connection::SqliteDb;
use crate::record::ResultRecord;
use crate::store::{DurableStore, StoreError};

/// A stored row of `inference_results`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub id: i64,
    pub request_id: String,
    pub result: String,
}

impl SqliteDb {
    /// Append one row inside a transaction and return its id.
    ///
    /// If the insert or the commit fails, the transaction is rolled back
    /// when it is dropped and no row becomes visible.
    pub async fn insert_result(&self, record: &ResultRecord) -> Result<i64, StoreError> {
        let request_id = record.request_id.clone();
        let result = record.payload_text()?;

        self.conn
            .call(move |conn| -> Result<i64, StoreError> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO inference_results (request_id, result) VALUES (?1, ?2)",
                    params![request_id, result],
                )?;
                let id = tx.last_insert_rowid();
                tx.commit().map_err(|e| StoreError::Commit(e.to_string()))?;
                Ok(id)
            })
            .await
            .map_err(StoreError::from)
    }

    /// Get a row by id.
    ///
    /// Returns None if the id doesn't exist.
    pub async fn get_result(&self, id: i64) -> Result<Option<ResultRow>, StoreError> {
        self.conn
            .call(move |conn| -> Result<Option<ResultRow>, StoreError> {
                let mut stmt =
                    conn.prepare("SELECT id, request_id, result FROM inference_results WHERE id = ?1")?;

                let result = stmt.query_row(params![id], row_to_result);

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(StoreError::from)
    }

    /// All rows stored under `request_id`, in insertion order.
    pub async fn results_for(&self, request_id: &str) -> Result<Vec<ResultRow>, StoreError> {
        let request_id = request_id.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<ResultRow>, StoreError> {
                let mut stmt = conn.prepare(
                    "SELECT id, request_id, result FROM inference_results
                     WHERE request_id = ?1 ORDER BY id ASC",
                )?;
                let rows = stmt
                    .query_map(params![request_id], row_to_result)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(StoreError::from)
    }

    /// Total number of stored rows.
    pub async fn count_results(&self) -> Result<u64, StoreError> {
        self.conn
            .call(|conn| -> Result<u64, StoreError> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM inference_results", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(StoreError::from)
    }
}

fn row_to_result(row: &tokio_rusqlite::rusqlite::Row<'_>) -> tokio_rusqlite::rusqlite::Result<ResultRow> {
    Ok(ResultRow { id: row.get(0)?, request_id: row.get(1)?, result: row.get(2)? })
}

#[async_trait]
impl DurableStore for SqliteDb {
    async fn insert(&self, record: &ResultRecord) -> Result<i64, StoreError> {
        self.insert_result(record).await
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
