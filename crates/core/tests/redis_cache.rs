//! Integration tests for `RedisCache`.
//!
//! The `#[ignore]` tests require a running Redis server. Set `REDIS_URL` to
//! point at it (defaults to `redis://127.0.0.1/`):
//!
//! ```bash
//! REDIS_URL=redis://127.0.0.1/ cargo test -p postline-core --test redis_cache -- --ignored
//! ```

use std::sync::Arc;
use std::time::Duration;

use postline_core::cache::RedisCacheConfig;
use postline_core::{CacheError, CacheStore, Coordinator, RedisCache, ResultRecord, SqliteDb};
use redis::AsyncCommands;
use serde_json::json;

const PREFIX: &str = "postline:test:";

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string())
}

fn test_cache() -> RedisCache {
    let config = RedisCacheConfig { url: redis_url(), prefix: PREFIX.to_string() };
    RedisCache::new(config).expect("Redis client creation failed")
}

async fn raw_connection() -> redis::aio::MultiplexedConnection {
    redis::Client::open(redis_url())
        .unwrap()
        .get_multiplexed_async_connection()
        .await
        .expect("failed to connect to Redis")
}

// ---------------------------------------------------------------------------
// No Redis required
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreachable_server_is_unavailable() {
    let cache = RedisCache::from_url("redis://127.0.0.1:1/").unwrap();
    let err = cache.put("req-1", "v", Duration::from_secs(60)).await.unwrap_err();
    assert!(matches!(err, CacheError::Unavailable(_)), "got {err:?}");
}

// ---------------------------------------------------------------------------
// Require a running Redis
// ---------------------------------------------------------------------------

#[tokio::test]
#[ignore = "requires running Redis"]
async fn put_sets_value_with_expiry() {
    let cache = test_cache();
    cache.put("req-ttl", r#"{"score":0.87}"#, Duration::from_secs(3600)).await.unwrap();

    assert_eq!(cache.get("req-ttl").await.unwrap().as_deref(), Some(r#"{"score":0.87}"#));

    let mut conn = raw_connection().await;
    let key = format!("{PREFIX}req-ttl");
    let ttl: i64 = conn.ttl(&key).await.unwrap();
    assert!((3590..=3600).contains(&ttl), "unexpected ttl {ttl}");

    conn.del::<_, ()>(&key).await.unwrap();
}

#[tokio::test]
#[ignore = "requires running Redis"]
async fn entry_expires_after_ttl() {
    let cache = test_cache();
    cache.put("req-short", "v", Duration::from_secs(1)).await.unwrap();
    assert!(cache.get("req-short").await.unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(cache.get("req-short").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires running Redis"]
async fn coordinator_caches_whole_record() {
    let cache = test_cache();
    let db = SqliteDb::open_in_memory().await.unwrap();
    let coordinator = Coordinator::new(Arc::new(cache.clone()), Arc::new(db.clone()));

    let accepted = coordinator.accept(Some("req-42"), json!({"score": 0.87})).await.unwrap();
    assert!(accepted.cache_warning.is_none());

    let record: ResultRecord = serde_json::from_str(&cache.get("req-42").await.unwrap().unwrap()).unwrap();
    assert_eq!(record.request_id, "req-42");
    assert_eq!(record.payload, json!({"score": 0.87}));
    assert_eq!(db.results_for("req-42").await.unwrap().len(), 1);

    raw_connection().await.del::<_, ()>(format!("{PREFIX}req-42")).await.unwrap();
}
