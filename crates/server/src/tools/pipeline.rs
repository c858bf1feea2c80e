//! run_pipeline tool implementation.
//!
//! Preprocess, infer, then cache-and-persist in one call.

use postline_client::Pipeline;
use postline_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::json_result;
use crate::tools::postprocess::PostprocessOutput;

/// Input parameters for the run_pipeline tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RunPipelineParams {
    /// Key for the cache entry and durable row.
    #[serde(default)]
    pub request_id: Option<String>,

    /// Raw text to normalize and send for inference.
    #[serde(default)]
    pub input_data: Option<String>,
}

/// Output from the run_pipeline tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunPipelineOutput {
    pub processed: String,
    pub inference_result: Value,
    pub postprocess: PostprocessOutput,
}

/// Implementation of the run_pipeline tool.
pub async fn run_impl(pipeline: &Pipeline, params: RunPipelineParams) -> Result<CallToolResult, McpError> {
    let raw = json!({ "input_data": params.input_data });
    let output = pipeline
        .run(params.request_id.as_deref(), &raw)
        .await
        .map_err(Error::from)?;

    json_result(&RunPipelineOutput {
        processed: output.processed.processed,
        inference_result: output.inference_result,
        postprocess: PostprocessOutput::from(output.accepted),
    })
}
