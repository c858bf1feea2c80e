//! preprocess tool implementation.
//!
//! Normalizes raw input text. No network or storage I/O.

use postline_client::normalize;
use postline_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::json_result;

/// Input parameters for the preprocess tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PreprocessParams {
    /// Raw text to normalize. Missing means empty.
    #[serde(default)]
    pub input_data: Option<String>,
}

/// Output from the preprocess tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PreprocessOutput {
    pub processed_data: ProcessedData,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProcessedData {
    pub processed: String,
}

/// Implementation of the preprocess tool.
pub async fn preprocess_impl(params: PreprocessParams) -> Result<CallToolResult, McpError> {
    let processed = normalize(&json!({ "input_data": params.input_data }))
        .map_err(|e| Error::InvalidInput(e.to_string()))?;

    json_result(&PreprocessOutput { processed_data: ProcessedData { processed: processed.processed } })
}
