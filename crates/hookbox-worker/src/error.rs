//! Per-hook delivery failure taxonomy.

use serde_json::{Value, json};

use hookbox_core::error::AppError;

/// Why a single hook could not be delivered.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// Expected to succeed on retry (timeout, connection reset, 5xx).
    #[error("Transient delivery failure: {0}")]
    Transient(String),

    /// No retry will fix it (invalid recipient, malformed params, 4xx).
    #[error("Permanent delivery failure: {0}")]
    Permanent(String),

    /// No handler is registered for the hook's event type.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error raised inside a handler.
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

impl DeliveryError {
    /// Check if the failure consumes a retry rather than ending the hook.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Internal(_))
    }

    /// Short machine-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Transient(_) => "transient",
            Self::Permanent(_) => "permanent",
            Self::Configuration(_) => "configuration",
            Self::Internal(_) => "internal",
        }
    }

    /// Payload stored in `failed_response`.
    pub fn to_response(&self, failed_count: i32) -> Value {
        json!({
            "error": self.label(),
            "message": self.to_string(),
            "failed_count": failed_count,
        })
    }
}
