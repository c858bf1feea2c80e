//! Pipeline stages upstream of the coordinator.
//!
//! This crate provides text preprocessing, the inference backend client, and
//! a [`Pipeline`] that chains both into the cache-then-persist coordinator.

pub mod inference;
pub mod pipeline;
pub mod preprocess;

pub use inference::{InferenceClient, InferenceConfig, InferenceError};
pub use pipeline::{Pipeline, PipelineError, PipelineOutput};
pub use preprocess::{PreprocessError, ProcessedInput, normalize};
