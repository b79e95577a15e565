//! Error types shared by the pingu crates.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while parsing configuration or quiet-window text.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid quiet window '{spec}': {reason}")]
    Window { spec: String, reason: String },

    #[error("retry increment must be a value between 1 and 3, got {0}")]
    RetryIncrement(u32),

    #[error("failed to read config {path}: {reason}")]
    ConfigRead { path: String, reason: String },

    #[error("failed to parse config {path}: {reason}")]
    ConfigParse { path: String, reason: String },
}

impl CoreError {
    pub(crate) fn window(spec: &str, reason: impl Into<String>) -> Self {
        CoreError::Window {
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }
}
