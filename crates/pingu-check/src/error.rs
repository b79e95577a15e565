//! Error types for check execution.

use pingu_core::CoreError;
use pingu_store::StoreError;
use thiserror::Error;

/// Result type alias for check operations.
pub type CheckResult<T> = Result<T, CheckError>;

/// Errors that stop a check. A failing assertion is not one of them; it is
/// reported as `CheckOutcome::Failed`.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("invalid configuration: {0}")]
    Config(#[from] CoreError),

    #[error("invalid content pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("history store error for {url}: {source}")]
    Storage {
        url: String,
        #[source]
        source: StoreError,
    },
}

impl CheckError {
    /// Whether the error was raised before any network activity.
    pub fn is_config(&self) -> bool {
        matches!(self, CheckError::Config(_) | CheckError::Pattern { .. } | CheckError::Client(_))
    }
}
