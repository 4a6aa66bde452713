//! Error types for canvas operations.

use thiserror::Error;

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur in canvas operations.
///
/// Unknown sticker ids are deliberately not an error: mutations on a
/// stale id are silent no-ops so a concurrent delete never turns a
/// queued gesture into a failure.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Canvas serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
