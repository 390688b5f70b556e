//! Contract with the store that owns the aggregated order.

use crate::error::Result;
use ranker_core::{ChangeSet, RawRecord};
use std::future::Future;

/// The remote side of an editing session.
///
/// Records come back raw; callers validate them before use. `apply_changes`
/// is all-or-nothing.
pub trait RemoteStore: Send + Sync + 'static {
    /// Current priority-ordered list.
    fn fetch_aggregated_order(&self) -> impl Future<Output = Result<Vec<RawRecord>>> + Send;

    /// Items ordered newest first.
    fn fetch_recently_added(&self) -> impl Future<Output = Result<Vec<RawRecord>>> + Send;

    /// Free-text search.
    fn fetch_suggestions(&self, query: &str)
    -> impl Future<Output = Result<Vec<RawRecord>>> + Send;

    /// Apply a batch of rank changes and deletions atomically.
    fn apply_changes(&self, payload: &ChangeSet) -> impl Future<Output = Result<()>> + Send;
}
