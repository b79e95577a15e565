use thiserror::Error;

/// Errors from building or delivering notifications.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("email host is required")]
    MissingHost,

    #[error("email sender must be a single address, got {0:?}")]
    SenderCount(String),

    #[error("email needs at least one recipient")]
    NoRecipients,

    #[error("invalid {field} address {address:?}: {reason}")]
    InvalidAddress {
        field: &'static str,
        address: String,
        reason: String,
    },

    #[error("failed to build email: {0}")]
    Build(String),

    #[error("failed to send email via {host}: {reason}")]
    Send { host: String, reason: String },
}

pub type NotifyResult<T> = Result<T, NotifyError>;
