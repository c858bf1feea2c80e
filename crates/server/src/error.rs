//! Structured errors for the postline server.

use rmcp::model::{CallToolResult, Content, ErrorCode, ErrorData as McpError};
use serde::Serialize;

/// Errors raised by the server layer itself, as opposed to the stages.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A tool output could not be serialized.
    #[error("OUTPUT_ERROR: {0}")]
    Output(String),
}

impl From<ServerError> for McpError {
    fn from(err: ServerError) -> Self {
        let code = match &err {
            ServerError::Output(_) => -32603,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}

/// Render a tool output as pretty JSON text content.
pub fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ServerError::Output(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
