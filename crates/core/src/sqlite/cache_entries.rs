//! Expiring cache entries stored in SQLite.
//!
//! Expiry is enforced on read (`expires_at > now`). Each write also deletes
//! every expired row, and [`SqliteDb::purge_expired_cache`] does the same on demand.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tokio_rusqlite::params;

use super::connection::SqliteDb;
use crate::cache::{CacheError, CacheStore};

/// Fixed-width RFC 3339 so stored timestamps compare correctly as text.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl From<tokio_rusqlite::Error<CacheError>> for CacheError {
    fn from(err: tokio_rusqlite::Error<CacheError>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            other => CacheError::Unavailable(other.to_string()),
        }
    }
}

impl From<tokio_rusqlite::rusqlite::Error> for CacheError {
    fn from(err: tokio_rusqlite::rusqlite::Error) -> Self {
        CacheError::Backend(err.to_string())
    }
}

impl SqliteDb {
    /// Insert or replace a cache entry readable for `ttl`, sweeping expired entries.
    pub async fn put_cache_entry(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let key = key.to_string();
        let value = value.to_string();

        let now = Utc::now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| CacheError::Backend(format!("ttl out of range: {ttl:?}")))?;
        let stored_at = timestamp(now);
        let expires_at = timestamp(expires_at);

        self.conn
            .call(move |conn| -> Result<(), CacheError> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM cache_entries WHERE expires_at <= ?1", params![stored_at])?;
                tx.execute(
                    "INSERT INTO cache_entries (key, value, stored_at, expires_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        stored_at = excluded.stored_at,
                        expires_at = excluded.expires_at",
                    params![key, value, stored_at, expires_at],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(CacheError::from)
    }

    /// Get a live cache entry by key.
    ///
    /// Returns None if the key doesn't exist or has expired.
    pub async fn get_cache_entry(&self, key: &str) -> Result<Option<String>, CacheError> {
        let key = key.to_string();
        let now = timestamp(Utc::now());
        self.conn
            .call(move |conn| -> Result<Option<String>, CacheError> {
                let mut stmt = conn.prepare("SELECT value FROM cache_entries WHERE key = ?1 AND expires_at > ?2")?;

                match stmt.query_row(params![key, now], |row| row.get(0)) {
                    Ok(value) => Ok(Some(value)),
                    Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(CacheError::from)
    }

    /// Delete expired cache entries.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_expired_cache(&self) -> Result<u64, CacheError> {
        let now = timestamp(Utc::now());
        self.conn
            .call(move |conn| -> Result<u64, CacheError> {
                let count = conn.execute("DELETE FROM cache_entries WHERE expires_at <= ?1", params![now])?;
                Ok(count as u64)
            })
            .await
            .map_err(CacheError::from)
    }
}

#[async_trait]
impl CacheStore for SqliteDb {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.put_cache_entry(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.get_cache_entry(key).await
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let db = SqliteDb::open_in_memory().await.unwrap();
        db.put_cache_entry("req-42", r#"{"score":0.87}"#, Duration::from_secs(3600))
            .await
            .unwrap();

        let value = db.get_cache_entry("req-42").await.unwrap().unwrap();
        assert_eq!(value, r#"{"score":0.87}"#);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = SqliteDb::open_in_memory().await.unwrap();
        assert!(db.get_cache_entry("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_unreadable() {
        let db = SqliteDb::open_in_memory().await.unwrap();
        db.put_cache_entry("short", "v", Duration::from_secs(1)).await.unwrap();
        assert!(db.get_cache_entry("short").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(db.get_cache_entry("short").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let db = SqliteDb::open_in_memory().await.unwrap();
        db.put_cache_entry("expiring", "v", Duration::from_secs(1)).await.unwrap();
        db.put_cache_entry("fresh", "v", Duration::from_secs(3600)).await.unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(db.purge_expired_cache().await.unwrap(), 1);
        assert!(db.get_cache_entry("fresh").await.unwrap().is_some());
    }

    async fn count_entries(db: &SqliteDb) -> i64 {
        db.conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_sweeps_expired_rows() {
        let db = SqliteDb::open_in_memory().await.unwrap();
        for i in 0..20 {
            db.put_cache_entry(&format!("req-{i}"), "v", Duration::from_secs(1)).await.unwrap();
        }
        assert_eq!(count_entries(&db).await, 20);

        tokio::time::sleep(Duration::from_secs(2)).await;
        db.put_cache_entry("fresh", "v", Duration::from_secs(3600)).await.unwrap();
        assert_eq!(count_entries(&db).await, 1);
    }

    #[tokio::test]
    async fn test_oversized_ttl_is_an_error() {
        let db = SqliteDb::open_in_memory().await.unwrap();
        let err = db.put_cache_entry("key", "v", Duration::MAX).await.unwrap_err();
        assert!(matches!(err, CacheError::Backend(_)));
        assert_eq!(count_entries(&db).await, 0);
    }

    #[tokio::test]
    async fn test_upsert_is_last_write_wins() {
        let db = SqliteDb::open_in_memory().await.unwrap();
        db.put_cache_entry("key", "old", Duration::from_secs(3600)).await.unwrap();
        db.put_cache_entry("key", "new", Duration::from_secs(3600)).await.unwrap();

        assert_eq!(db.get_cache_entry("key").await.unwrap().as_deref(), Some("new"));
    }
}
