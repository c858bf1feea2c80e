//! Preprocess stage: text normalization ahead of inference.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field of the raw request that carries the text to normalize.
pub const INPUT_FIELD: &str = "input_data";

/// Errors from the preprocess stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreprocessError {
    #[error("raw input must be a JSON object")]
    NotAnObject,

    #[error("`input_data` must be a string, got {0}")]
    NotText(&'static str),
}

/// Normalized input handed to the inference stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedInput {
    pub processed: String,
}

/// Normalize a raw request.
///
/// Reads `input_data` (absent or null means empty text) and lowercases it.
/// Whitespace is passed through untouched.
pub fn normalize(raw: &Value) -> Result<ProcessedInput, PreprocessError> {
    let object = raw.as_object().ok_or(PreprocessError::NotAnObject)?;

    let text = match object.get(INPUT_FIELD) {
        None | Some(Value::Null) => "",
        Some(Value::String(s)) => s.as_str(),
        Some(other) => return Err(PreprocessError::NotText(json_type(other))),
    };

    Ok(ProcessedInput { processed: text.to_lowercase() })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
