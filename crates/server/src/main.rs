//! postline server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use postline_client::{InferenceClient, Pipeline};
use postline_core::{AppConfig, Coordinator};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        cache_backend = ?config.cache_backend,
        store_backend = ?config.store_backend,
        cache_ttl_secs = config.cache_ttl_secs,
        "Starting postline server on stdio transport"
    );

    let coordinator = Coordinator::connect(&config).await?;
    let inference = InferenceClient::from_config(&config)?;

    let handler = handler::PostlineServer::new(Pipeline::new(inference, coordinator));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
