//! Priority diff between a working list and its baseline.
//!
//! Only walks the working list forward, so items missing from it (deleted)
//! are never reported here; deletions are recorded when they happen.

use crate::change::{ChangeRecord, ChangeSet};
use crate::item::{Category, Item, ItemKey};
use std::collections::HashMap;

/// 1-based priority for a list position.
#[must_use]
pub fn priority_for(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

fn position_index(baseline: &[Item]) -> HashMap<(Category, &ItemKey), usize> {
    baseline
        .iter()
        .enumerate()
        .map(|(i, item)| ((item.category(), item.key()), i))
        .collect()
}

/// Compute the minimal set of rank changes from `baseline` to `working`.
///
/// An item is reported when it is new or its index moved, with
/// `new_priority = index + 1`. Records appear in working-list order within
/// each category bucket.
#[must_use]
pub fn compute_changes(working: &[Item], baseline: &[Item]) -> ChangeSet {
    let index = position_index(baseline);
    let mut changes = ChangeSet::new();

    for (current, item) in working.iter().enumerate() {
        let original = index.get(&(item.category(), item.key())).copied();
        if original != Some(current) {
            changes.push(
                item.category(),
                ChangeRecord::ranked(item.key().clone(), priority_for(current)),
            );
        }
    }

    changes
}

/// Whether the two sequences differ in length or in identity at any position.
#[must_use]
pub fn has_positional_mismatch(working: &[Item], baseline: &[Item]) -> bool {
    working.len() != baseline.len()
        || working
            .iter()
            .zip(baseline)
            .any(|(w, b)| !w.same_identity(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn event(key: &str) -> Item {
        Item::new(ItemKey::new(key).unwrap(), Category::Event)
    }

    fn location(key: &str) -> Item {
        Item::new(ItemKey::new(key).unwrap(), Category::Location)
    }

    fn ranked(key: &str, priority: u32) -> ChangeRecord {
        ChangeRecord::ranked(ItemKey::new(key).unwrap(), priority)
    }

    #[test]
    fn test_identical_lists_produce_nothing() {
        let list = vec![event("a"), location("b"), event("c")];
        assert!(compute_changes(&list, &list).is_empty());
        assert!(!has_positional_mismatch(&list, &list));
        assert!(compute_changes(&[], &[]).is_empty());
    }

    #[test]
    fn test_only_moved_items_reported() {
        let baseline = vec![event("a"), event("b"), event("c"), event("d")];
        // swap b and c
        let working = vec![event("a"), event("c"), event("b"), event("d")];

        let changes = compute_changes(&working, &baseline);
        assert_eq!(changes.events, vec![ranked("c", 2), ranked("b", 3)]);
        assert!(changes.locations.is_empty());
    }

    #[test]
    fn test_new_item_and_shift() {
        let baseline = vec![event("a"), location("b")];
        let working = vec![location("n"), event("a"), location("b")];

        let changes = compute_changes(&working, &baseline);
        assert_eq!(changes.events, vec![ranked("a", 2)]);
        assert_eq!(changes.locations, vec![ranked("n", 1), ranked("b", 3)]);
    }

    #[test]
    fn test_same_key_in_other_category_is_distinct() {
        let baseline = vec![event("x")];
        let working = vec![location("x")];

        let changes = compute_changes(&working, &baseline);
        assert!(changes.events.is_empty());
        assert_eq!(changes.locations, vec![ranked("x", 1)]);
        assert!(has_positional_mismatch(&working, &baseline));
    }

    #[test]
    fn test_removed_items_not_reported() {
        let baseline = vec![event("a"), event("b")];
        let working = vec![event("a")];

        assert!(compute_changes(&working, &baseline).is_empty());
        assert!(has_positional_mismatch(&working, &baseline));
    }
}
