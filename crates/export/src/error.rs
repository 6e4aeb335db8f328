//! Error types for portfolio export.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    /// The render engine failed to produce output for a document.
    #[error("Render failed: {0}")]
    Render(String),
}

impl ExportError {
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }
}
