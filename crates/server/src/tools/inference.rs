//! inference tool implementation.
//!
//! Forwards normalized input to the model-serving backend.

use postline_client::InferenceClient;
use postline_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::json_result;

/// Input parameters for the inference tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct InferenceParams {
    /// Normalized input, usually the output of the preprocess tool.
    #[serde(default)]
    pub input_data: String,
}

/// Output from the inference tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InferenceOutput {
    /// The backend's JSON response, untouched.
    pub inference_result: Value,
}

/// Implementation of the inference tool.
pub async fn inference_impl(client: &InferenceClient, params: InferenceParams) -> Result<CallToolResult, McpError> {
    let inference_result = client.infer(&params.input_data).await.map_err(Error::from)?;
    json_result(&InferenceOutput { inference_result })
}

#[cfg(test)]
mod tests {
    use super::*;
    use postline_client::InferenceConfig;

    #[tokio::test]
    async fn test_inference_unreachable_backend() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            InferenceClient::new(InferenceConfig { host: format!("http://{addr}"), ..Default::default() }).unwrap();
        let err = inference_impl(&client, InferenceParams { input_data: "x".into() }).await.unwrap_err();
        assert_eq!(err.code.0, -32003);
    }
}
