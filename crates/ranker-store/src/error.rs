//! Error types for the store backend.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store not found at the specified path.
    #[error("store not found at '{0}'")]
    StoreNotFound(PathBuf),

    /// Store already exists.
    #[error("store already exists at '{0}'")]
    StoreExists(PathBuf),

    /// Item not found.
    #[error("item not found: {0}")]
    ItemNotFound(String),

    /// Unqualified key matches items in more than one category.
    #[error("key '{0}' exists in more than one category; qualify it as <type>:<key>")]
    AmbiguousKey(String),

    /// Item already exists.
    #[error("item already exists: {0}")]
    ItemExists(String),

    /// Change record names a key that only exists under another category.
    #[error("item '{key}' is not a {expected}")]
    CategoryMismatch { key: String, expected: String },

    /// Batch refused as a whole; nothing was applied.
    #[error("change batch rejected: {0}")]
    Rejected(String),

    /// Remote side unreachable or failed in transit.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Core library error.
    #[error("core error: {0}")]
    Core(#[from] ranker_core::CoreError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}
