//! Inference stage: forwards normalized input to a model-serving backend.
//!
//! - **Endpoint**: `POST {host}/inference`
//! - **Request body**: `{"data": <normalized text>}`
//! - **Response**: any JSON value, returned to the caller untouched
//!
//! The client makes one attempt per call; retries belong to the caller.

pub mod error;

pub use error::InferenceError;

use reqwest::header;
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use url::Url;

use postline_core::AppConfig;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = concat!("postline/", env!("CARGO_PKG_VERSION"));

/// Inference client configuration.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Backend base URL, e.g. `http://ollama.internal:11434`.
    pub host: String,
    /// Request timeout (default: 30s).
    pub timeout: Duration,
    /// User-agent string.
    pub user_agent: String,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&AppConfig> for InferenceConfig {
    fn from(config: &AppConfig) -> Self {
        Self { host: config.inference_host.clone(), timeout: config.inference_timeout(), ..Default::default() }
    }
}

/// Build the inference endpoint from a base URL, keeping any path prefix.
pub fn endpoint(host: &str) -> Result<Url, InferenceError> {
    let base = host.trim().trim_end_matches('/');
    let url =
        Url::parse(&format!("{base}/inference")).map_err(|e| InferenceError::InvalidHost(format!("{host}: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(InferenceError::InvalidHost(format!("unsupported scheme: {other}"))),
    }
}

/// HTTP client for the model-serving backend.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl InferenceClient {
    /// Create a new client with the given configuration.
    pub fn new(config: InferenceConfig) -> Result<Self, InferenceError> {
        let endpoint = endpoint(&config.host)?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { http, endpoint })
    }

    /// Create a client from application configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, InferenceError> {
        Self::new(InferenceConfig::from(config))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send normalized input to the backend and return its JSON response.
    pub async fn infer(&self, input: &str) -> Result<Value, InferenceError> {
        let start = Instant::now();
        tracing::debug!(endpoint = %self.endpoint, input_len = input.len(), "calling inference backend");

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(header::ACCEPT, "application/json")
            .json(&json!({ "data": input }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "inference backend returned an error");
            return Err(InferenceError::HttpError { status: status.as_u16() });
        }

        let bytes = response.bytes().await?;
        let value: Value = serde_json::from_slice(&bytes).map_err(|e| InferenceError::Parse(e.to_string()))?;

        tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "inference completed");

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> InferenceClient {
        InferenceClient::new(InferenceConfig { host: server.uri(), ..Default::default() }).unwrap()
    }

    #[test]
    fn test_endpoint_join() {
        assert_eq!(endpoint("http://ollama:11434").unwrap().as_str(), "http://ollama:11434/inference");
        assert_eq!(endpoint("http://ollama:11434/").unwrap().as_str(), "http://ollama:11434/inference");
        assert_eq!(
            endpoint("https://gw.example.com/models/").unwrap().as_str(),
            "https://gw.example.com/models/inference"
        );
    }

    #[test]
    fn test_endpoint_rejects_bad_hosts() {
        assert!(matches!(endpoint("ftp://ollama"), Err(InferenceError::InvalidHost(_))));
        assert!(matches!(endpoint("not a url"), Err(InferenceError::InvalidHost(_))));
    }

    #[test]
    fn test_config_from_app_config() {
        let app =
            AppConfig { inference_host: "http://model:8080".into(), inference_timeout_ms: 500, ..Default::default() };
        let config = InferenceConfig::from(&app);
        assert_eq!(config.host, "http://model:8080");
        assert_eq!(config.timeout, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_infer_posts_data_and_returns_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/inference"))
            .and(header("accept", "application/json"))
            .and(body_json(json!({"data": "hello world"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"score": 0.87})))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server).infer("hello world").await.unwrap();
        assert_eq!(result, json!({"score": 0.87}));
    }

    #[tokio::test]
    async fn test_infer_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/inference"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).infer("x").await.unwrap_err();
        assert!(matches!(err, InferenceError::HttpError { status: 503 }));
    }

    #[tokio::test]
    async fn test_infer_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/inference"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        assert!(matches!(client_for(&server).infer("x").await, Err(InferenceError::Parse(_))));
    }

    #[tokio::test]
    async fn test_infer_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = InferenceConfig { host: format!("http://{addr}"), ..Default::default() };
        let client = InferenceClient::new(config).unwrap();
        assert!(matches!(client.infer("x").await, Err(InferenceError::Network(_))));
    }

    #[tokio::test]
    async fn test_infer_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/inference"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"late": true}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = InferenceClient::new(InferenceConfig {
            host: server.uri(),
            timeout: Duration::from_millis(200),
            ..Default::default()
        })
        .unwrap();
        assert!(matches!(client.infer("x").await, Err(InferenceError::Timeout)));
    }
}
