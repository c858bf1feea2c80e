//! cache_get tool implementation.
//!
//! Reads the live cache entry for a request id.

use postline_core::{CacheError, CacheStore, Error, ResultRecord};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// The request id the result was cached under.
    pub request_id: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub request_id: String,
    pub payload: Value,
    pub stored_at: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(cache: &dyn CacheStore, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let raw = cache
        .get(&params.request_id)
        .await
        .map_err(Error::from)?
        .ok_or_else(|| Error::CacheMiss(params.request_id.clone()))?;

    let record: ResultRecord = serde_json::from_str(&raw).map_err(|e| {
        Error::Cache(CacheError::Serialization(format!(
            "cache entry for {} is not a result record: {e}",
            params.request_id
        )))
    })?;

    json_result(&CacheGetOutput {
        request_id: record.request_id,
        payload: record.payload,
        stored_at: record.stored_at.to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tests::{memory_coordinator, output_of};
    use postline_core::MemoryCache;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_get_impl_missing() {
        let cache = MemoryCache::new();
        let params = CacheGetParams { request_id: "nonexistent".to_string() };

        let err = get_impl(&cache, params).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_get_impl_after_accept() {
        let (coordinator, cache, _db) = memory_coordinator().await;
        coordinator.accept(Some("req-42"), json!({"score": 0.87})).await.unwrap();

        let params = CacheGetParams { request_id: "req-42".to_string() };
        let output: CacheGetOutput = output_of(get_impl(&cache, params).await.unwrap());
        assert_eq!(output.request_id, "req-42");
        assert_eq!(output.payload, json!({"score": 0.87}));
    }

    #[tokio::test]
    async fn test_get_impl_foreign_value() {
        let cache = MemoryCache::new();
        cache.put("raw", "not a record", Duration::from_secs(60)).await.unwrap();

        let err = get_impl(&cache, CacheGetParams { request_id: "raw".into() }).await.unwrap_err();
        assert_eq!(err.code.0, -32002);
        assert!(err.message.starts_with("CACHE_ERROR"));
    }
}
