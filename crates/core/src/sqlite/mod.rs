//! SQLite backend for both stores.
//!
//! One database file holds the append-only `inference_results` table and the
//! expiring `cache_entries` table. Access goes through tokio-rusqlite, which
//! runs every operation on a dedicated background thread.
//!
//! - WAL mode for concurrent readers
//! - Versioned schema migrations
//! - Explicit transactions around every durable insert

pub mod cache_entries;
pub mod connection;
pub mod migrations;
pub mod results;

pub use connection::SqliteDb;
pub use results::ResultRow;
