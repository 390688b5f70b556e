//! Error types for editing sessions.

use thiserror::Error;

/// Result type alias for editor operations.
pub type Result<T> = std::result::Result<T, EditorError>;

/// Errors that can occur while talking to an editing session.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The session has ended (committed, closed, or its task stopped).
    #[error("editing session is closed")]
    Closed,

    /// The session refused a command.
    #[error("{command} rejected: {reason}")]
    Rejected { command: String, reason: String },

    /// The remote store did not apply the changes.
    #[error("commit failed: {0}")]
    CommitFailed(String),
}
