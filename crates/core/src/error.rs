//! Unified error types for postline.
//!
//! Every variant renders with a stable `CODE: message` prefix so callers on the
//! far side of the MCP transport can match on the code.

use rmcp::model::{ErrorCode, ErrorData as McpError};

use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::coordinator::AcceptError;
use crate::store::StoreError;

/// Unified error type for the postline server and client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., a missing request id under the reject policy).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// No live cache entry for the given key.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Cache store operation failed.
    #[error("CACHE_ERROR: {0}")]
    Cache(#[from] CacheError),

    /// Durable store operation failed.
    #[error("STORE_ERROR: {0}")]
    Store(#[from] StoreError),

    /// The inference backend could not produce a result.
    #[error("INFERENCE_ERROR: {0}")]
    Inference(String),

    /// Configuration could not be loaded or is invalid.
    #[error("CONFIG_ERROR: {0}")]
    Config(#[from] ConfigError),
}

impl From<AcceptError> for Error {
    fn from(err: AcceptError) -> Self {
        match err {
            AcceptError::MissingRequestId => Error::InvalidInput("request_id is required".into()),
            AcceptError::DurableWriteFailed { source, .. } => Error::Store(source),
        }
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) => -32602,
            Error::CacheMiss(_) => -32001,
            Error::Cache(_) | Error::Store(_) => -32002,
            Error::Inference(_) => -32003,
            Error::Config(_) => -32004,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::CacheMiss("req-42".to_string());
        assert!(err.to_string().contains("CACHE_MISS"));
        assert!(err.to_string().contains("req-42"));
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::CacheMiss("req-42".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32001);
    }

    #[test]
    fn test_store_error_maps_to_storage_code() {
        let err: Error = StoreError::Unavailable("connection refused".into()).into();
        assert!(err.to_string().starts_with("STORE_ERROR"));
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32002);
    }

    #[test]
    fn test_accept_error_conversion() {
        let err: Error = AcceptError::MissingRequestId.into();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err: Error = AcceptError::DurableWriteFailed {
            source: StoreError::Commit("disk I/O error".into()),
            cache_warning: None,
        }
        .into();
        assert!(matches!(err, Error::Store(StoreError::Commit(_))));
    }
}
