//! postprocess tool implementation.
//!
//! Caches an inference result and appends it to the durable store.

use postline_core::{Accepted, Coordinator, Error};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::json_result;

/// Input parameters for the postprocess tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PostprocessParams {
    /// Key for the cache entry. Missing or empty is handled per the
    /// configured request id policy.
    #[serde(default)]
    pub request_id: Option<String>,

    /// The inference result to cache and persist.
    #[serde(default)]
    pub result: Value,
}

/// Output from the postprocess tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PostprocessOutput {
    pub message: String,
    /// The key the result was cached and stored under.
    pub request_id: String,
    /// Id of the appended durable row.
    pub row_id: i64,
    /// RFC 3339 timestamp of the write.
    pub stored_at: String,
    /// False when the cache write failed; the durable row still exists.
    pub cached: bool,
    /// Why the cache write failed, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_warning: Option<String>,
}

impl From<Accepted> for PostprocessOutput {
    fn from(accepted: Accepted) -> Self {
        let cached = accepted.cache_warning.is_none();
        let message = if cached {
            "Data cached and stored successfully".to_string()
        } else {
            "Data stored successfully; cache write failed".to_string()
        };

        Self {
            message,
            request_id: accepted.request_id,
            row_id: accepted.row_id,
            stored_at: accepted.stored_at.to_rfc3339(),
            cached,
            cache_warning: accepted.cache_warning.map(|e| e.to_string()),
        }
    }
}

/// Implementation of the postprocess tool.
pub async fn postprocess_impl(
    coordinator: &Coordinator, params: PostprocessParams,
) -> Result<CallToolResult, McpError> {
    let accepted = coordinator
        .accept(params.request_id.as_deref(), params.result)
        .await
        .map_err(Error::from)?;

    json_result(&PostprocessOutput::from(accepted))
}
