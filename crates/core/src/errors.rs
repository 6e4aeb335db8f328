//! Error types for the domain crate.

use thiserror::Error;

/// Result type alias for domain operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by local validation, before anything reaches the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A form field failed a length or format check.
    #[error("Validation failed for {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// A selected image exceeds the client-side size limit.
    #[error("Image is {size_bytes} bytes, limit is {max_bytes} bytes")]
    ImageTooLarge { size_bytes: usize, max_bytes: usize },
}

impl CoreError {
    /// Create a validation error for a named field.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// True when the error should keep the active form open.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
