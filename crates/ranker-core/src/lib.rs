//! ranker-core: Item model and priority diff engine for manual reordering.
//!
//! This crate provides:
//! - `Item`: a validated event or location with a stable identity key
//! - `compute_changes`: the minimal rank changes between a working list and its baseline
//! - `EditSession`: insert/delete/move on a working list, plus the commit state machine
//! - `build_payload`: deletions and rank changes merged per category

pub mod aggregate;
pub mod change;
pub mod command;
pub mod diff;
pub mod error;
pub mod item;
pub mod session;

pub use aggregate::build_payload;
pub use change::{ChangeRecord, ChangeSet};
pub use command::{EditOp, EditorCommand, EditorEvent};
pub use diff::{compute_changes, has_positional_mismatch, priority_for};
pub use error::{CoreError, Result};
pub use item::{normalize_all, Category, Item, ItemKey, RawRecord};
pub use session::{EditSession, SaveState};
