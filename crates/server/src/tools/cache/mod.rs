//! Cache-related MCP tools.
//!
//! This module provides tools for reading the result cache.

pub mod get;

pub use get::{CacheGetParams, get_impl};
