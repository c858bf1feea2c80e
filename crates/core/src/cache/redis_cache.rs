//! Redis-backed cache store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tokio::sync::OnceCell;

use super::{CacheError, CacheStore};

/// Configuration for [`RedisCache`].
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Connection URL, e.g. `redis://redis-service:6379/0`.
    pub url: String,
    /// Prepended to every key. Empty by default so the key is the request id itself.
    pub prefix: String,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self { url: "redis://127.0.0.1:6379/0".to_string(), prefix: String::new() }
    }
}

/// [`CacheStore`] backed by Redis, with expiry delegated to `SET ... EX`.
///
/// The multiplexed connection is established on first use and shared by all
/// clones afterwards. A failed connect is reported to the caller and retried
/// on the next call.
#[derive(Clone)]
pub struct RedisCache {
    client: redis::Client,
    config: RedisCacheConfig,
    conn: Arc<OnceCell<MultiplexedConnection>>,
}

impl RedisCache {
    /// Create a cache from a configuration. Does not connect.
    pub fn new(config: RedisCacheConfig) -> Result<Self, CacheError> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| CacheError::Unavailable(format!("invalid Redis URL {}: {e}", config.url)))?;
        Ok(Self { client, config, conn: Default::default() })
    }

    /// Create a cache from a URL with no key prefix.
    pub fn from_url(url: &str) -> Result<Self, CacheError> {
        Self::new(RedisCacheConfig { url: url.to_string(), ..Default::default() })
    }

    fn redis_key(&self, key: &str) -> String {
        format!("{}{key}", self.config.prefix)
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                tracing::debug!(url = %self.config.url, "connecting to Redis");
                self.client.get_multiplexed_async_connection().await.map_err(map_redis_error)
            })
            .await?;
        Ok(conn.clone())
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").field("config", &self.config).finish_non_exhaustive()
    }
}

fn map_redis_error(err: redis::RedisError) -> CacheError {
    if err.is_io_error() || err.is_connection_refusal() || err.is_timeout() || err.is_connection_dropped() {
        CacheError::Unavailable(err.to_string())
    } else {
        CacheError::Backend(err.to_string())
    }
}

/// Redis rejects `EX 0`; sub-second TTLs round up to one second.
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(self.redis_key(key), value, ttl_seconds(ttl))
            .await
            .map_err(map_redis_error)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        conn.get(self.redis_key(key)).await.map_err(map_redis_error)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
