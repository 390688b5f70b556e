//! Error types for ranker-core.

use thiserror::Error;

/// Result type alias for ranker-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in ranker-core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Record carries neither a `uid` nor an `id`.
    #[error("record has no identity key (neither 'uid' nor 'id')")]
    MissingKey,

    /// Identity field present but unusable (empty, or not a string/integer).
    #[error("invalid identity key: {0}")]
    InvalidKey(String),

    /// Record has no category tag.
    #[error("record '{0}' has no category")]
    MissingCategory(String),

    /// Category tag is not one we know how to rank.
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    /// A list index was outside the working list.
    #[error("{op}: index {index} out of range for list of length {len}")]
    IndexOutOfRange {
        op: &'static str,
        index: usize,
        len: usize,
    },

    /// Edit or commit attempted while a commit is still in flight.
    #[error("a commit is already in flight")]
    CommitInFlight,

    /// Malformed textual edit operation.
    #[error("invalid edit operation: {0}")]
    InvalidOperation(String),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
