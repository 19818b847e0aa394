use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("assessment not found: {key}")]
    NotFound { key: String },

    #[error("assessment already exists: {key}")]
    Conflict { key: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 GetObject error: {0}")]
    GetObject(String),

    #[error("S3 PutObject error: {0}")]
    PutObject(String),

    #[error("S3 ListObjects error: {0}")]
    ListObjects(String),
}
