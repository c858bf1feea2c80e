//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::cache::{CacheGetParams, get_impl};
use crate::tools::inference::{InferenceParams, inference_impl};
use crate::tools::pipeline::{RunPipelineParams, run_impl};
use crate::tools::postprocess::{PostprocessParams, postprocess_impl};
use crate::tools::preprocess::{PreprocessParams, preprocess_impl};

use postline_client::Pipeline;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for postline.
#[derive(Clone)]
pub struct PostlineServer {
    tool_router: ToolRouter<Self>,
    pipeline: Pipeline,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl PostlineServer {
    /// Create a new server handler around a wired pipeline.
    pub fn new(pipeline: Pipeline) -> Self {
        Self { tool_router: Self::tool_router(), pipeline }
    }

    #[tool(description = "Normalize raw input text by lowercasing it.")]
    async fn preprocess(&self, params: Parameters<PreprocessParams>) -> Result<CallToolResult, McpError> {
        preprocess_impl(params.0).await
    }

    #[tool(description = "Send normalized input to the inference backend and return its JSON response.")]
    async fn inference(&self, params: Parameters<InferenceParams>) -> Result<CallToolResult, McpError> {
        inference_impl(self.pipeline.inference(), params.0).await
    }

    /// Cache an inference result, then append it to the durable store.
    ///
    /// A cache failure is reported as a warning in the output; a durable
    /// failure fails the call.
    #[tool(
        description = "Cache an inference result under request_id with a TTL, then append it to the durable store. Returns the stored row id."
    )]
    async fn postprocess(&self, params: Parameters<PostprocessParams>) -> Result<CallToolResult, McpError> {
        postprocess_impl(self.pipeline.coordinator(), params.0).await
    }

    #[tool(description = "Retrieve the live cached result for a request_id.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(self.pipeline.coordinator().cache().as_ref(), params.0).await
    }

    #[tool(description = "Run preprocess, inference and postprocess in sequence for one request.")]
    async fn run_pipeline(&self, params: Parameters<RunPipelineParams>) -> Result<CallToolResult, McpError> {
        run_impl(&self.pipeline, params.0).await
    }
}

impl ServerHandler for PostlineServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "postline".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
