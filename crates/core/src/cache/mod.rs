//! Cache store: fast, ephemeral lookups of recent results.
//!
//! Entries expire natively after their TTL; no background compaction runs.
//! Three backends implement [`CacheStore`]:
//!
//! - [`RedisCache`]: `SET key value EX ttl` against a Redis server
//! - [`SqliteDb`](crate::SqliteDb): an expiring table next to the durable rows
//! - [`MemoryCache`]: an in-process map, mainly for tests and single-node runs

mod memory;
mod redis_cache;

use std::time::Duration;

use async_trait::async_trait;

pub use memory::MemoryCache;
pub use redis_cache::{RedisCache, RedisCacheConfig};

/// Errors from a cache store.
///
/// These are never fatal to the write path; the coordinator attaches them to
/// the outcome as a warning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// The backing service could not be reached.
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// The value could not be serialized for storage.
    #[error("cache serialization failed: {0}")]
    Serialization(String),

    /// The backend rejected the command.
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// A key-value store with per-key expiration.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous entry, readable until `ttl` elapses.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Read the live entry under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Short backend name used in logs.
    fn name(&self) -> &'static str;
}
