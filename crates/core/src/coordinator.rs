//! Cache-then-persist write path.
//!
//! [`Coordinator::accept`] takes a `(request_id, payload)` pair and:
//!
//! 1. writes the serialized [`ResultRecord`] to the cache store under the
//!    request id with a TTL. A failure here is soft: it is logged and attached
//!    to the outcome, and the call carries on.
//! 2. appends one row to the durable store inside a transaction. A failure
//!    here is hard: the transaction is rolled back and the call fails.
//!
//! Each call makes exactly one attempt against each store. There are no
//! retries and no deduplication, so two identical calls append two rows.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;
use crate::cache::{CacheError, CacheStore, MemoryCache, RedisCache};
use crate::config::{AppConfig, CacheBackend, StoreBackend};
use crate::record::ResultRecord;
use crate::sqlite::SqliteDb;
use crate::store::{DurableStore, PostgresStore, StoreError};

/// Key used for calls without a request id under [`RequestIdPolicy::Fallback`].
pub const DEFAULT_REQUEST_ID: &str = "default";

/// Default cache TTL: one hour.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// What to do with a missing or empty request id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestIdPolicy {
    /// Substitute [`DEFAULT_REQUEST_ID`]. Anonymous calls share one cache key.
    #[default]
    Fallback,
    /// Fail the call before touching either store.
    Reject,
    /// Use a fresh UUID v4 for each call.
    Generate,
}

/// The two ways a write can go wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Soft: the result was persisted but is not cached.
    CacheWriteFailed,
    /// Hard: nothing was persisted.
    DurableWriteFailed,
}

/// A committed write.
#[derive(Debug, Clone, PartialEq)]
pub struct Accepted {
    /// The key actually used, after the request id policy was applied.
    pub request_id: String,
    /// Id of the appended durable row.
    pub row_id: i64,
    pub stored_at: DateTime<Utc>,
    /// Set when the cache write failed; the durable write still committed.
    pub cache_warning: Option<CacheError>,
}

impl Accepted {
    /// The soft failure attached to this outcome, if any.
    pub fn soft_failure(&self) -> Option<FailureKind> {
        self.cache_warning.as_ref().map(|_| FailureKind::CacheWriteFailed)
    }
}

/// A write that did not commit.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AcceptError {
    /// No request id was supplied under [`RequestIdPolicy::Reject`].
    #[error("request_id is required")]
    MissingRequestId,

    /// The durable insert or commit failed and was rolled back.
    #[error("durable write failed: {source}")]
    DurableWriteFailed {
        #[source]
        source: StoreError,
        /// The cache write outcome from step 1, if it also failed.
        cache_warning: Option<CacheError>,
    },
}

impl AcceptError {
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            AcceptError::MissingRequestId => None,
            AcceptError::DurableWriteFailed { .. } => Some(FailureKind::DurableWriteFailed),
        }
    }
}

/// Combined result of one [`Coordinator::accept`] call.
pub type Outcome = Result<Accepted, AcceptError>;

/// Writes results to a cache store, then to a durable store.
///
/// Both stores are injected and shared; the coordinator holds no mutable
/// state of its own, so clones can be used from any number of tasks.
#[derive(Clone)]
pub struct Coordinator {
    cache: Arc<dyn CacheStore>,
    store: Arc<dyn DurableStore>,
    ttl: Duration,
    policy: RequestIdPolicy,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("cache", &self.cache.name())
            .field("store", &self.store.name())
            .field("ttl", &self.ttl)
            .field("policy", &self.policy)
            .finish()
    }
}

impl Coordinator {
    /// Create a coordinator with the default TTL and [`RequestIdPolicy::Fallback`].
    pub fn new(cache: Arc<dyn CacheStore>, store: Arc<dyn DurableStore>) -> Self {
        Self { cache, store, ttl: DEFAULT_CACHE_TTL, policy: RequestIdPolicy::default() }
    }

    /// Create a coordinator with TTL and policy taken from configuration.
    pub fn from_config(cache: Arc<dyn CacheStore>, store: Arc<dyn DurableStore>, config: &AppConfig) -> Self {
        Self::new(cache, store)
            .with_ttl(config.cache_ttl())
            .with_policy(config.missing_request_id)
    }

    /// Open the configured stores and build a coordinator over them.
    ///
    /// When both backends are SQLite they share one database handle.
    pub async fn connect(config: &AppConfig) -> Result<Self, Error> {
        let mut sqlite = None;

        let store: Arc<dyn DurableStore> = match config.store_backend {
            StoreBackend::Sqlite => Arc::new(shared_sqlite(&mut sqlite, config).await?),
            StoreBackend::Postgres => Arc::new(PostgresStore::connect(&config.pg_config()).await?),
        };

        let cache: Arc<dyn CacheStore> = match config.cache_backend {
            CacheBackend::Redis => Arc::new(RedisCache::from_url(&config.redis_url())?),
            CacheBackend::Sqlite => Arc::new(shared_sqlite(&mut sqlite, config).await?),
            CacheBackend::Memory => Arc::new(MemoryCache::new()),
        };

        tracing::info!(cache = cache.name(), store = store.name(), ttl_secs = config.cache_ttl_secs, "stores opened");

        Ok(Self::from_config(cache, store, config))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_policy(mut self, policy: RequestIdPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn policy(&self) -> RequestIdPolicy {
        self.policy
    }

    /// The cache this coordinator writes to, for read-side lookups.
    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// Apply the request id policy to a caller-supplied id.
    pub fn resolve_request_id(&self, request_id: Option<&str>) -> Result<String, AcceptError> {
        match request_id.filter(|id| !id.is_empty()) {
            Some(id) => Ok(id.to_string()),
            None => match self.policy {
                RequestIdPolicy::Fallback => {
                    tracing::warn!(key = DEFAULT_REQUEST_ID, "request_id missing; falling back to shared key");
                    Ok(DEFAULT_REQUEST_ID.to_string())
                }
                RequestIdPolicy::Reject => Err(AcceptError::MissingRequestId),
                RequestIdPolicy::Generate => Ok(uuid::Uuid::new_v4().to_string()),
            },
        }
    }

    /// Cache `payload` under `request_id`, then append it to the durable store.
    ///
    /// # Errors
    ///
    /// Returns `AcceptError::DurableWriteFailed` if the durable insert or commit
    /// fails, regardless of the cache write. Returns
    /// `AcceptError::MissingRequestId` only under [`RequestIdPolicy::Reject`].
    pub async fn accept(&self, request_id: Option<&str>, payload: Value) -> Outcome {
        let request_id = self.resolve_request_id(request_id)?;
        let record = ResultRecord::new(request_id, payload);

        let cache_warning = self.write_cache(&record).await.err();

        match self.store.insert(&record).await {
            Ok(row_id) => {
                tracing::info!(
                    request_id = %record.request_id,
                    row_id,
                    store = self.store.name(),
                    cached = cache_warning.is_none(),
                    "result persisted"
                );
                Ok(Accepted { request_id: record.request_id, row_id, stored_at: record.stored_at, cache_warning })
            }
            Err(source) => {
                tracing::error!(
                    request_id = %record.request_id,
                    store = self.store.name(),
                    error = %source,
                    "durable write failed"
                );
                Err(AcceptError::DurableWriteFailed { source, cache_warning })
            }
        }
    }

    async fn write_cache(&self, record: &ResultRecord) -> Result<(), CacheError> {
        let result = match record.to_cache_value() {
            Ok(value) => self.cache.put(&record.request_id, &value, self.ttl).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(()) => tracing::debug!(
                request_id = %record.request_id,
                cache = self.cache.name(),
                ttl_secs = self.ttl.as_secs(),
                "result cached"
            ),
            Err(e) => tracing::warn!(
                request_id = %record.request_id,
                cache = self.cache.name(),
                error = %e,
                "cache write failed; continuing to durable write"
            ),
        }

        result
    }
}

/// Open the SQLite database once and hand out clones of the same handle.
async fn shared_sqlite(slot: &mut Option<SqliteDb>, config: &AppConfig) -> Result<SqliteDb, StoreError> {
    if let Some(db) = slot {
        return Ok(db.clone());
    }
    let db = SqliteDb::open(&config.db_path).await?;
    *slot = Some(db.clone());
    Ok(db)
}
