//! MCP tool implementations.
//!
//! This module contains all tools exposed by the postline server.

pub mod cache;
pub mod inference;
pub mod pipeline;
pub mod postprocess;
pub mod preprocess;

#[cfg(test)]
pub(crate) mod tests {
    use postline_core::{Coordinator, MemoryCache, SqliteDb};
    use rmcp::model::CallToolResult;
    use serde::de::DeserializeOwned;
    use std::sync::Arc;

    /// Parse the JSON text content of a tool result.
    pub(crate) fn output_of<T: DeserializeOwned>(result: CallToolResult) -> T {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val["text"].as_str().unwrap();
        serde_json::from_str(text).unwrap()
    }

    pub(crate) async fn memory_coordinator() -> (Coordinator, MemoryCache, SqliteDb) {
        let cache = MemoryCache::new();
        let db = SqliteDb::open_in_memory().await.unwrap();
        let coordinator = Coordinator::new(Arc::new(cache.clone()), Arc::new(db.clone()));
        (coordinator, cache, db)
    }
}
