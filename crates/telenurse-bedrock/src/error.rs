use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BedrockError {
    #[error("model invocation failed: {0}")]
    Invocation(String),

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("response parsing failed: {0}")]
    ResponseParse(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("AWS config error: {0}")]
    Config(String),
}

impl BedrockError {
    /// Transport-level failures that may succeed on another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, BedrockError::Invocation(_) | BedrockError::Timeout(_))
    }
}
