use thiserror::Error;

use telenurse_bedrock::error::BedrockError;
use telenurse_core::error::CoreError;
use telenurse_core::models::session::SessionPhase;
use telenurse_storage::error::StorageError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {operation} while the session is {}", phase.as_str())]
    InvalidState {
        operation: &'static str,
        phase: SessionPhase,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cannot {operation}: a language model call is in progress")]
    Busy { operation: &'static str },

    #[error("language model error: {0}")]
    Gateway(#[from] BedrockError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<CoreError> for SessionError {
    fn from(e: CoreError) -> Self {
        SessionError::InvalidInput(e.to_string())
    }
}
