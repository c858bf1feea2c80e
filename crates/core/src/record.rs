//! The result record handed to the coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::CacheError;
use crate::store::StoreError;

/// A single inference result on its way into the cache and the durable store.
///
/// The record has no identity beyond the call that built it: the cache entry
/// and the durable row derived from it live independently afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub request_id: String,
    pub payload: Value,
    pub stored_at: DateTime<Utc>,
}

impl ResultRecord {
    /// Build a record stamped with the current time.
    pub fn new(request_id: impl Into<String>, payload: Value) -> Self {
        Self { request_id: request_id.into(), payload, stored_at: Utc::now() }
    }

    /// Serialized form written to the cache: the whole record, not just the payload.
    pub fn to_cache_value(&self) -> Result<String, CacheError> {
        serde_json::to_string(self).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    /// Serialized payload written to the durable `result` column.
    pub fn payload_text(&self) -> Result<String, StoreError> {
        serde_json::to_string(&self.payload).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}
