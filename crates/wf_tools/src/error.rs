//! Tool errors.

use thiserror::Error;
use wf_core::GenError;

/// Result type alias using [`ToolError`].
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors surfaced by the `wf-tools` commands.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Loading or composing the world failed.
    #[error(transparent)]
    Compose(#[from] GenError),

    /// A report could not be written as JSON.
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Composition succeeded but validation found errors.
    #[error("{errors} validation error(s)")]
    ValidationFailed {
        /// Number of error-severity issues.
        errors: usize,
    },
}
