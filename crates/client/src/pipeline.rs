//! End-to-end request pipeline: preprocess, infer, then cache-and-persist.

use serde_json::Value;

use postline_core::{AcceptError, Accepted, Coordinator};

use crate::inference::{InferenceClient, InferenceError};
use crate::preprocess::{self, PreprocessError, ProcessedInput};

/// Errors from a pipeline run, tagged by the stage that failed.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("preprocess failed: {0}")]
    Preprocess(#[from] PreprocessError),

    #[error("inference failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("postprocess failed: {0}")]
    Postprocess(#[from] AcceptError),
}

impl From<PipelineError> for postline_core::Error {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Preprocess(e) => postline_core::Error::InvalidInput(e.to_string()),
            PipelineError::Inference(e) => e.into(),
            PipelineError::Postprocess(e) => e.into(),
        }
    }
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub processed: ProcessedInput,
    pub inference_result: Value,
    pub accepted: Accepted,
}

/// The three stages wired together.
#[derive(Debug, Clone)]
pub struct Pipeline {
    inference: InferenceClient,
    coordinator: Coordinator,
}

impl Pipeline {
    pub fn new(inference: InferenceClient, coordinator: Coordinator) -> Self {
        Self { inference, coordinator }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn inference(&self) -> &InferenceClient {
        &self.inference
    }

    /// Run one raw request through all three stages.
    ///
    /// A stage failure stops the run; nothing is cached or persisted unless
    /// inference succeeded.
    pub async fn run(&self, request_id: Option<&str>, raw: &Value) -> Result<PipelineOutput, PipelineError> {
        let processed = preprocess::normalize(raw)?;
        let inference_result = self.inference.infer(&processed.processed).await?;
        let accepted = self.coordinator.accept(request_id, inference_result.clone()).await?;

        Ok(PipelineOutput { processed, inference_result, accepted })
    }
}
