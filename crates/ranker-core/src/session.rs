//! Editing session: baseline, working list, mutations and commit state.

use crate::aggregate::build_payload;
use crate::change::ChangeSet;
use crate::diff::{compute_changes, has_positional_mismatch};
use crate::error::{CoreError, Result};
use crate::item::Item;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Commit state of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaveState {
    #[default]
    Idle,
    Saving,
}

impl fmt::Display for SaveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Saving => write!(f, "SAVING"),
        }
    }
}

/// One operator's editing session over an ordering.
///
/// The baseline is only replaced by a successful commit. Every mutation of
/// the working list recomputes the diff wholesale.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    baseline: Vec<Item>,
    working: Vec<Item>,
    deletions: ChangeSet,
    diff: ChangeSet,
    state: SaveState,
}

impl EditSession {
    /// Open a session with the baseline and working list both seeded from `items`.
    #[must_use]
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            baseline: items.clone(),
            working: items,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn baseline(&self) -> &[Item] {
        &self.baseline
    }

    #[must_use]
    pub fn working(&self) -> &[Item] {
        &self.working
    }

    /// Deletion records accumulated this session.
    #[must_use]
    pub const fn deletions(&self) -> &ChangeSet {
        &self.deletions
    }

    /// Latest diff output.
    #[must_use]
    pub const fn diff(&self) -> &ChangeSet {
        &self.diff
    }

    #[must_use]
    pub const fn state(&self) -> SaveState {
        self.state
    }

    /// Position of an item with the same identity, if present.
    #[must_use]
    pub fn position_of(&self, item: &Item) -> Option<usize> {
        self.working.iter().position(|i| i.same_identity(item))
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.state {
            SaveState::Idle => Ok(()),
            SaveState::Saving => Err(CoreError::CommitInFlight),
        }
    }

    fn check_index(&self, op: &'static str, index: usize) -> Result<()> {
        if index >= self.working.len() {
            return Err(CoreError::IndexOutOfRange {
                op,
                index,
                len: self.working.len(),
            });
        }
        Ok(())
    }

    fn recompute(&mut self) {
        self.diff = compute_changes(&self.working, &self.baseline);
        debug!(
            changed = self.diff.len(),
            deleted = self.deletions.len(),
            "Recomputed changes"
        );
    }

    /// Insert an item at the top of the working list.
    ///
    /// Returns `false` without touching anything if an item with the same
    /// identity is already present.
    ///
    /// # Errors
    /// Returns `CoreError::CommitInFlight` while saving.
    pub fn insert(&mut self, item: Item) -> Result<bool> {
        self.ensure_idle()?;

        if self.position_of(&item).is_some() {
            debug!(key = %item.key(), "Item already present, insert ignored");
            return Ok(false);
        }

        // Re-inserting a deleted item supersedes its pending deletion.
        self.deletions
            .bucket_mut(item.category())
            .retain(|r| &r.key != item.key());

        self.working.insert(0, item);
        self.recompute();
        Ok(true)
    }

    /// Remove the item at `index` and record its deletion.
    ///
    /// # Errors
    /// Returns `CoreError::IndexOutOfRange` for a bad index, or
    /// `CoreError::CommitInFlight` while saving.
    pub fn delete(&mut self, index: usize) -> Result<Item> {
        self.ensure_idle()?;
        self.check_index("delete", index)?;

        let item = self.working.remove(index);
        self.deletions.push_deletion(&item);
        self.recompute();
        Ok(item)
    }

    /// Move the item at `from` so it ends up at `to`.
    ///
    /// Returns `false` when `from == to`.
    ///
    /// # Errors
    /// Returns `CoreError::IndexOutOfRange` if either index is outside the
    /// list, or `CoreError::CommitInFlight` while saving.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<bool> {
        self.ensure_idle()?;
        self.check_index("move", from)?;
        self.check_index("move", to)?;

        if from == to {
            return Ok(false);
        }

        let item = self.working.remove(from);
        self.working.insert(to, item);
        self.recompute();
        Ok(true)
    }

    /// Whether there is anything to commit.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.deletions.is_empty()
            || !self.diff.is_empty()
            || has_positional_mismatch(&self.working, &self.baseline)
    }

    /// Payload that a commit would send right now.
    #[must_use]
    pub fn payload(&self) -> ChangeSet {
        build_payload(&self.deletions, &self.diff)
    }

    /// Enter `Saving` and hand out the payload to apply.
    ///
    /// Returns `None` if a commit is already in flight.
    pub fn begin_commit(&mut self) -> Option<ChangeSet> {
        if self.state == SaveState::Saving {
            warn!("Commit already in flight, ignoring");
            return None;
        }
        self.state = SaveState::Saving;
        Some(self.payload())
    }

    /// Leave `Saving`. On success the working list becomes the new baseline
    /// and pending changes are cleared; on failure everything is kept for retry.
    pub fn finish_commit(&mut self, succeeded: bool) {
        self.state = SaveState::Idle;
        if succeeded {
            self.baseline = self.working.clone();
            self.deletions.clear();
            self.diff.clear();
            info!(items = self.baseline.len(), "Rebased on committed order");
        } else {
            warn!(
                pending = self.deletions.len() + self.diff.len(),
                "Commit failed, edits kept"
            );
        }
    }
}
