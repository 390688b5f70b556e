//! Remote store contract and a file-backed catalog for ranker.
//!
//! The file store keeps everything under `.ranker/`:
//! - `config.yml`: store and editor settings
//! - `catalog.yml`: every known item with its aggregated flag and priority

pub mod config;
pub mod error;
pub mod remote;
pub mod store;

pub use config::{EditorSettings, StoreConfig};
pub use error::{Result, StoreError};
pub use remote::RemoteStore;
pub use store::{ApplySummary, CatalogEntry, FileStore};
