//! Merges accumulated deletions with diff output into one outbound payload.

use crate::change::ChangeSet;
use crate::item::Category;

/// Build the payload sent to the remote store.
///
/// Per category: deletions first, then the latest diff records. No
/// de-duplication is done here; a deleted item is no longer in the working
/// list, so it cannot also show up in the diff.
#[must_use]
pub fn build_payload(deletions: &ChangeSet, diff: &ChangeSet) -> ChangeSet {
    let mut payload = ChangeSet::new();
    for category in Category::ALL {
        let bucket = payload.bucket_mut(category);
        bucket.extend_from_slice(deletions.bucket(category));
        bucket.extend_from_slice(diff.bucket(category));
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeRecord;
    use crate::item::ItemKey;
    use pretty_assertions::assert_eq;

    fn key(s: &str) -> ItemKey {
        ItemKey::new(s).unwrap()
    }

    #[test]
    fn test_deletions_precede_diff() {
        let mut deletions = ChangeSet::new();
        deletions.push(Category::Event, ChangeRecord::deleted(key("gone")));

        let mut diff = ChangeSet::new();
        diff.push(Category::Event, ChangeRecord::ranked(key("moved"), 1));
        diff.push(Category::Location, ChangeRecord::ranked(key("loc"), 2));

        let payload = build_payload(&deletions, &diff);
        assert_eq!(
            payload.events,
            vec![
                ChangeRecord::deleted(key("gone")),
                ChangeRecord::ranked(key("moved"), 1)
            ]
        );
        assert_eq!(payload.locations, vec![ChangeRecord::ranked(key("loc"), 2)]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(build_payload(&ChangeSet::new(), &ChangeSet::new()).is_empty());
    }
}
