//! Asynchronous editing sessions for manual reordering.
//!
//! A session runs as its own task. The UI sends `EditorCommand`s through an
//! `EditorHandle` and receives `EditorEvent`s back; commits are serialized
//! and searches are debounced so that only the latest query is answered.

pub mod error;
mod search;
pub mod session;

pub use error::{EditorError, Result};
pub use session::{open_session, EditorHandle};
