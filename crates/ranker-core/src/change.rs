//! Change records and per-category change sets.

use crate::item::{Category, Item, ItemKey};
use serde::{Deserialize, Serialize};

/// One item's new rank, or a deletion marker.
///
/// `new_priority: None` with `is_aggregated: false` is a deletion;
/// `new_priority: Some(n)` with `is_aggregated: true` is an insert or move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub key: ItemKey,
    pub new_priority: Option<u32>,
    pub is_aggregated: bool,
}

impl ChangeRecord {
    /// Record placing an item at a 1-based priority.
    #[must_use]
    pub const fn ranked(key: ItemKey, priority: u32) -> Self {
        Self {
            key,
            new_priority: Some(priority),
            is_aggregated: true,
        }
    }

    /// Record removing an item from the aggregated order.
    #[must_use]
    pub const fn deleted(key: ItemKey) -> Self {
        Self {
            key,
            new_priority: None,
            is_aggregated: false,
        }
    }

    #[must_use]
    pub const fn is_deletion(&self) -> bool {
        !self.is_aggregated && self.new_priority.is_none()
    }
}

/// Change records partitioned by category. Also the outbound payload shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(default)]
    pub events: Vec<ChangeRecord>,
    #[serde(default)]
    pub locations: Vec<ChangeRecord>,
}

impl ChangeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket for a category.
    #[must_use]
    pub fn bucket(&self, category: Category) -> &[ChangeRecord] {
        match category {
            Category::Event => &self.events,
            Category::Location => &self.locations,
        }
    }

    pub fn bucket_mut(&mut self, category: Category) -> &mut Vec<ChangeRecord> {
        match category {
            Category::Event => &mut self.events,
            Category::Location => &mut self.locations,
        }
    }

    pub fn push(&mut self, category: Category, record: ChangeRecord) {
        self.bucket_mut(category).push(record);
    }

    /// Record the deletion of `item` in its category bucket.
    pub fn push_deletion(&mut self, item: &Item) {
        self.push(item.category(), ChangeRecord::deleted(item.key().clone()));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.locations.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len() + self.locations.len()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.locations.clear();
    }

    /// Iterate all records with their category, events first.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &ChangeRecord)> {
        Category::ALL
            .into_iter()
            .flat_map(move |c| self.bucket(c).iter().map(move |r| (c, r)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> ItemKey {
        ItemKey::new(s).unwrap()
    }

    #[test]
    fn test_wire_format() {
        let mut set = ChangeSet::new();
        set.push(Category::Event, ChangeRecord::ranked(key("D"), 1));
        set.push(Category::Location, ChangeRecord::deleted(key("B")));

        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "events": [{"key": "D", "newPriority": 1, "isAggregated": true}],
                "locations": [{"key": "B", "newPriority": null, "isAggregated": false}]
            })
        );
    }

    #[test]
    fn test_buckets_stay_separate() {
        let mut set = ChangeSet::new();
        set.push(Category::Location, ChangeRecord::ranked(key("x"), 2));

        assert!(set.bucket(Category::Event).is_empty());
        assert_eq!(set.bucket(Category::Location).len(), 1);
        assert_eq!(set.len(), 1);
        assert!(set.bucket(Category::Location)[0].is_aggregated);

        set.clear();
        assert!(set.is_empty());
    }
}
