//! Core types and the cache-then-persist write path for postline.
//!
//! This crate provides:
//! - The [`Coordinator`] that caches a result, then appends it to the durable store
//! - Cache store backends (Redis, SQLite, in-memory)
//! - Durable store backends (SQLite, PostgreSQL)
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod record;
pub mod sqlite;
pub mod store;

pub use cache::{CacheError, CacheStore, MemoryCache, RedisCache};
pub use config::{AppConfig, CacheBackend, ConfigError, StoreBackend};
pub use coordinator::{AcceptError, Accepted, Coordinator, DEFAULT_REQUEST_ID, FailureKind, Outcome, RequestIdPolicy};
pub use error::Error;
pub use record::ResultRecord;
pub use sqlite::SqliteDb;
pub use store::{DurableStore, PostgresStore, StoreError};
