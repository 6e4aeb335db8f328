//! Error types for the sync crate.

use thiserror::Error;

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur while reconciling local state with the store.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Provider error reported by the remote store (permission, quota,
    /// connectivity). Never retried automatically.
    #[error("Gateway error ({code}): {message}")]
    Gateway { code: String, message: String },

    /// Local validation failure; blocks the write before it is attempted.
    #[error(transparent)]
    Domain(#[from] certihub_core::CoreError),

    /// An operation that requires an authenticated identity ran without one.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Create a gateway error from a provider code and message.
    pub fn gateway(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Gateway {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Provider error code, if this is a gateway error.
    pub fn gateway_code(&self) -> Option<&str> {
        match self {
            Self::Gateway { code, .. } => Some(code),
            _ => None,
        }
    }
}
