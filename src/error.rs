//! Error types for the storage layer and configuration

use thiserror::Error;

/// Fatal storage fault. Not-found is never an error at this layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage handle poisoned by a panicking request")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("HBNB_TYPE_STORAGE must be \"db\" or \"file\", got {0:?}")]
    InvalidStorageType(String),

    #[error("HBNB_API_PORT is not a valid port: {0:?}")]
    InvalidPort(String),
}
