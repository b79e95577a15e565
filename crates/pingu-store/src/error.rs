//! Error types for the pingu history store.

use thiserror::Error;

/// Result type alias for history store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing check history.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open store directory: {0}")]
    Open(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("corrupt history file: {0}")]
    Deserialize(String),

    #[error("no data directory available; set [store].dir")]
    NoDataDir,
}
