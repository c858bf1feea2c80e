//! In-process cache with per-entry expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{CacheError, CacheStore};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// A process-local [`CacheStore`].
///
/// Expired entries are unreadable immediately. They are dropped on the next
/// read of the same key, and every write sweeps all expired entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held, live or not yet evicted.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Remaining time-to-live of a live entry.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.lock().await;
        let entry = entries.get(key)?;
        entry.expires_at.checked_duration_since(Instant::now()).filter(|d| !d.is_zero())
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| CacheError::Backend(format!("ttl out of range: {ttl:?}")))?;

        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(key.to_string(), Entry { value: value.to_string(), expires_at });
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
