//! Inference client error types.

use std::sync::Arc;

/// Errors from the inference backend client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InferenceError {
    /// The configured backend URL is unusable.
    #[error("invalid inference host: {0}")]
    InvalidHost(String),

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Response body was not JSON.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for InferenceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { InferenceError::Timeout } else { InferenceError::Network(Arc::new(err)) }
    }
}

impl From<InferenceError> for postline_core::Error {
    fn from(err: InferenceError) -> Self {
        postline_core::Error::Inference(err.to_string())
    }
}
