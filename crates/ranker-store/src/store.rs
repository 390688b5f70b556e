//! File-backed catalog implementing the remote store.

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::remote::RemoteStore;
use chrono::{DateTime, Utc};
use ranker_core::{Category, ChangeRecord, ChangeSet, Item, ItemKey, RawRecord};
use serde::{Deserialize, Serialize};
use slug::slugify;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Directory name for ranker data.
const RANKER_DIR: &str = ".ranker";
/// Configuration file name.
const CONFIG_FILE: &str = "config.yml";
/// Catalog file name.
const CATALOG_FILE: &str = "catalog.yml";

/// One catalog entry: an item plus its ranking state.
///
/// Stored in the same `{uid, type, ...}` shape the store hands out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "StoredEntry", into = "StoredEntry")]
pub struct CatalogEntry {
    pub item: Item,

    /// When the item was added to the catalog.
    pub added_at: DateTime<Utc>,

    /// Whether the item is part of the aggregated order.
    #[serde(default)]
    pub aggregated: bool,

    /// Rank in the aggregated order (1-based).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    #[serde(flatten)]
    record: RawRecord,
    added_at: DateTime<Utc>,
    #[serde(default)]
    aggregated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    priority: Option<u32>,
}

impl TryFrom<StoredEntry> for CatalogEntry {
    type Error = ranker_core::CoreError;

    fn try_from(stored: StoredEntry) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            item: Item::from_record(stored.record)?,
            added_at: stored.added_at,
            aggregated: stored.aggregated,
            priority: stored.priority,
        })
    }
}

impl From<CatalogEntry> for StoredEntry {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            record: entry.item.to_record(),
            added_at: entry.added_at,
            aggregated: entry.aggregated,
            priority: entry.priority,
        }
    }
}

/// Counts from a successful batch apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub ranked: usize,
    pub removed: usize,
}

/// A store keeps a catalog of items on the filesystem.
#[derive(Debug)]
pub struct FileStore {
    /// Root path of the store.
    root: PathBuf,
    /// Store configuration.
    config: StoreConfig,
    /// Serializes read-modify-write cycles on the catalog.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Initialize a new store at the given path.
    ///
    /// # Errors
    /// Returns error if store already exists or IO fails.
    pub fn init(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let ranker_dir = root.join(RANKER_DIR);

        if ranker_dir.exists() {
            return Err(StoreError::StoreExists(root));
        }

        fs::create_dir_all(&ranker_dir)?;

        let config = StoreConfig::default();
        fs::write(ranker_dir.join(CONFIG_FILE), serde_yaml::to_string(&config)?)?;

        let store = Self {
            root,
            config,
            write_lock: Mutex::new(()),
        };
        store.write_catalog(&[])?;

        info!(path = %store.root.display(), "Initialized store");

        Ok(store)
    }

    /// Open an existing store at the given path.
    ///
    /// # Errors
    /// Returns error if store doesn't exist or config is invalid.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let config_path = root.join(RANKER_DIR).join(CONFIG_FILE);

        if !config_path.exists() {
            return Err(StoreError::StoreNotFound(root));
        }

        let config: StoreConfig = serde_yaml::from_str(&fs::read_to_string(&config_path)?)?;

        debug!(path = %root.display(), "Opened store");

        Ok(Self {
            root,
            config,
            write_lock: Mutex::new(()),
        })
    }

    /// Get the store root path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the store configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn catalog_path(&self) -> PathBuf {
        self.root.join(RANKER_DIR).join(CATALOG_FILE)
    }

    /// Add an item to the catalog. It is not ranked until an edit inserts it.
    ///
    /// The uid defaults to `<category>-<slug of name>`.
    ///
    /// # Errors
    /// Returns error if the uid is taken within the category or IO fails.
    pub fn add_item(&self, name: &str, category: Category, uid: Option<&str>) -> Result<Item> {
        let key = match uid {
            Some(uid) => ItemKey::new(uid)?,
            None => ItemKey::new(format!("{category}-{}", slugify(name)))?,
        };

        let _guard = self.lock()?;
        let mut catalog = self.read_catalog()?;

        if catalog
            .iter()
            .any(|e| e.item.category() == category && e.item.key() == &key)
        {
            return Err(StoreError::ItemExists(key.to_string()));
        }

        let item = Item::new(key, category).with_field("name", name);
        catalog.push(CatalogEntry {
            item: item.clone(),
            added_at: Utc::now(),
            aggregated: false,
            priority: None,
        });
        self.write_catalog(&catalog)?;

        info!(key = %item.key(), category = %category, "Added item");

        Ok(item)
    }

    /// Find an item by key, within `category` if given.
    ///
    /// # Errors
    /// Returns `StoreError::ItemNotFound` if nothing matches, or
    /// `StoreError::AmbiguousKey` if an unqualified key exists in several
    /// categories.
    pub fn find(&self, key: &str, category: Option<Category>) -> Result<Item> {
        let mut matches = self.read_catalog()?.into_iter().filter(|e| {
            e.item.key().as_str() == key && category.is_none_or(|c| e.item.category() == c)
        });

        match (matches.next(), matches.next()) {
            (Some(entry), None) => Ok(entry.item),
            (Some(_), Some(_)) => Err(StoreError::AmbiguousKey(key.to_string())),
            (None, _) => Err(StoreError::ItemNotFound(key.to_string())),
        }
    }

    /// Aggregated items in priority order.
    ///
    /// # Errors
    /// Returns error if the catalog can't be read.
    pub fn order(&self) -> Result<Vec<Item>> {
        let mut ranked: Vec<CatalogEntry> = self
            .read_catalog()?
            .into_iter()
            .filter(|e| e.aggregated)
            .collect();
        ranked.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| a.item.key().cmp(b.item.key()))
        });
        Ok(ranked.into_iter().map(|e| e.item).collect())
    }

    /// Items newest first, optionally capped.
    ///
    /// # Errors
    /// Returns error if the catalog can't be read.
    pub fn recent(&self, limit: Option<usize>) -> Result<Vec<Item>> {
        // Later catalog entries win ties on `added_at`.
        let mut entries: Vec<CatalogEntry> = self.read_catalog()?.into_iter().rev().collect();
        entries.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        Ok(entries
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|e| e.item)
            .collect())
    }

    /// Case-insensitive search over key and name.
    ///
    /// # Errors
    /// Returns error if the catalog can't be read.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<Item>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .read_catalog()?
            .into_iter()
            .map(|e| e.item)
            .filter(|item| {
                item.key().as_str().to_lowercase().contains(&needle)
                    || item
                        .name()
                        .is_some_and(|n| n.to_lowercase().contains(&needle))
            })
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }

    /// Apply a change batch. Every record is validated before anything is
    /// written; one bad record rejects the batch.
    ///
    /// # Errors
    /// Returns `ItemNotFound`, `CategoryMismatch` or `Rejected` for an invalid
    /// batch, or an IO error.
    pub fn apply(&self, payload: &ChangeSet) -> Result<ApplySummary> {
        let _guard = self.lock()?;
        let mut catalog = self.read_catalog()?;

        let mut targets = Vec::with_capacity(payload.len());
        for (category, record) in payload.iter() {
            validate_record(record)?;
            targets.push((locate(&catalog, category, &record.key)?, record));
        }

        let mut summary = ApplySummary::default();
        let mut touched = vec![false; catalog.len()];
        for (index, record) in targets {
            let entry = &mut catalog[index];
            entry.aggregated = record.is_aggregated;
            entry.priority = record.new_priority;
            touched[index] = true;
            if record.is_deletion() {
                summary.removed += 1;
            } else {
                summary.ranked += 1;
            }
        }

        compact_priorities(&mut catalog, &touched);
        self.write_catalog(&catalog)?;

        info!(
            ranked = summary.ranked,
            removed = summary.removed,
            "Applied change batch"
        );

        Ok(summary)
    }

    // Private helpers

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Internal("catalog lock poisoned".into()))
    }

    fn read_catalog(&self) -> Result<Vec<CatalogEntry>> {
        let path = self.catalog_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        Ok(serde_yaml::from_str(&fs::read_to_string(&path)?)?)
    }

    fn write_catalog(&self, catalog: &[CatalogEntry]) -> Result<()> {
        let path = self.catalog_path();
        let tmp = path.with_extension("yml.tmp");
        fs::write(&tmp, serde_yaml::to_string(catalog)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

fn validate_record(record: &ChangeRecord) -> Result<()> {
    match (record.is_aggregated, record.new_priority) {
        (true, Some(p)) if p >= 1 => Ok(()),
        (false, None) => Ok(()),
        (true, _) => Err(StoreError::Rejected(format!(
            "'{}' is aggregated but has no valid priority",
            record.key
        ))),
        (false, Some(_)) => Err(StoreError::Rejected(format!(
            "'{}' is a deletion but carries a priority",
            record.key
        ))),
    }
}

fn locate(catalog: &[CatalogEntry], category: Category, key: &ItemKey) -> Result<usize> {
    if let Some(index) = catalog
        .iter()
        .position(|e| e.item.category() == category && e.item.key() == key)
    {
        return Ok(index);
    }

    if catalog.iter().any(|e| e.item.key() == key) {
        Err(StoreError::CategoryMismatch {
            key: key.to_string(),
            expected: category.to_string(),
        })
    } else {
        Err(StoreError::ItemNotFound(key.to_string()))
    }
}

/// Renumber aggregated entries 1..n. On equal priority, entries touched by
/// the batch go first.
fn compact_priorities(catalog: &mut [CatalogEntry], touched: &[bool]) {
    let mut ranked: Vec<usize> = (0..catalog.len())
        .filter(|&i| catalog[i].aggregated)
        .collect();
    ranked.sort_by(|&a, &b| {
        catalog[a]
            .priority
            .cmp(&catalog[b].priority)
            .then_with(|| touched[b].cmp(&touched[a]))
            .then_with(|| catalog[a].item.key().cmp(catalog[b].item.key()))
    });

    for (rank, index) in ranked.into_iter().enumerate() {
        let priority = ranker_core::priority_for(rank);
        if catalog[index].priority != Some(priority) {
            debug!(key = %catalog[index].item.key(), priority, "Compacted priority");
        }
        catalog[index].priority = Some(priority);
    }
}

fn to_records(items: Vec<Item>) -> Vec<RawRecord> {
    items.iter().map(Item::to_record).collect()
}

impl RemoteStore for FileStore {
    async fn fetch_aggregated_order(&self) -> Result<Vec<RawRecord>> {
        self.order().map(to_records)
    }

    async fn fetch_recently_added(&self) -> Result<Vec<RawRecord>> {
        self.recent(None).map(to_records)
    }

    async fn fetch_suggestions(&self, query: &str) -> Result<Vec<RawRecord>> {
        self.search(query, None).map(to_records)
    }

    async fn apply_changes(&self, payload: &ChangeSet) -> Result<()> {
        self.apply(payload).map(|_| ()).inspect_err(|e| {
            warn!(error = %e, "Rejected change batch");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileStore) {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::init(tmp.path()).unwrap();
        (tmp, store)
    }

    fn key(s: &str) -> ItemKey {
        ItemKey::new(s).unwrap()
    }

    fn keys(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.key().as_str()).collect()
    }

    /// Store with `a`, `b` (events) and `c` (location) ranked in that order.
    fn ranked_store() -> (TempDir, FileStore) {
        let (tmp, store) = setup();
        store.add_item("A", Category::Event, Some("a")).unwrap();
        store.add_item("B", Category::Event, Some("b")).unwrap();
        store.add_item("C", Category::Location, Some("c")).unwrap();

        let mut payload = ChangeSet::new();
        payload.push(Category::Event, ChangeRecord::ranked(key("a"), 1));
        payload.push(Category::Event, ChangeRecord::ranked(key("b"), 2));
        payload.push(Category::Location, ChangeRecord::ranked(key("c"), 3));
        store.apply(&payload).unwrap();

        (tmp, store)
    }

    #[test]
    fn test_init_store() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::init(tmp.path()).unwrap();

        assert!(tmp.path().join(".ranker/config.yml").exists());
        assert!(tmp.path().join(".ranker/catalog.yml").exists());
        assert_eq!(store.config().version, 1);
        assert!(store.order().unwrap().is_empty());
    }

    #[test]
    fn test_init_existing_fails() {
        let (tmp, _store) = setup();
        let result = FileStore::init(tmp.path());
        assert!(matches!(result, Err(StoreError::StoreExists(_))));
    }

    #[test]
    fn test_open_missing_fails() {
        let tmp = TempDir::new().unwrap();
        let result = FileStore::open(tmp.path());
        assert!(matches!(result, Err(StoreError::StoreNotFound(_))));
    }

    #[test]
    fn test_add_item_generates_key() {
        let (_tmp, store) = setup();

        let item = store.add_item("Summer Fair", Category::Event, None).unwrap();
        assert_eq!(item.key().as_str(), "event-summer-fair");
        assert_eq!(item.name(), Some("Summer Fair"));

        let dup = store.add_item("Summer Fair", Category::Event, None);
        assert!(matches!(dup, Err(StoreError::ItemExists(_))));

        // new items are catalogued but unranked
        assert!(store.order().unwrap().is_empty());
        assert_eq!(store.find("event-summer-fair", None).unwrap(), item);
    }

    #[test]
    fn test_find_same_key_in_two_categories() {
        let (_tmp, store) = setup();
        store.add_item("X ev", Category::Event, Some("x")).unwrap();
        store.add_item("X loc", Category::Location, Some("x")).unwrap();

        let location = store.find("x", Some(Category::Location)).unwrap();
        assert_eq!(location.category(), Category::Location);
        assert_eq!(location.name(), Some("X loc"));

        let event = store.find("x", Some(Category::Event)).unwrap();
        assert_eq!(event.name(), Some("X ev"));

        assert!(matches!(store.find("x", None), Err(StoreError::AmbiguousKey(k)) if k == "x"));
        assert!(matches!(
            store.find("y", Some(Category::Event)),
            Err(StoreError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_catalog_file_uses_record_shape() {
        let (tmp, store) = ranked_store();

        let raw = fs::read_to_string(tmp.path().join(".ranker/catalog.yml")).unwrap();
        let entries: Vec<serde_yaml::Value> = serde_yaml::from_str(&raw).unwrap();
        let third = &entries[2];
        assert_eq!(third["uid"].as_str(), Some("c"));
        assert_eq!(third["type"].as_str(), Some("location"));
        assert_eq!(third["name"].as_str(), Some("C"));
        assert_eq!(third["priority"].as_u64(), Some(3));
        assert!(third.get("key").is_none());

        // hand-written entries with a numeric id load too
        let appended = format!(
            "{raw}- id: 77\n  type: event\n  name: Imported\n  added_at: 2024-05-01T10:00:00Z\n"
        );
        fs::write(tmp.path().join(".ranker/catalog.yml"), appended).unwrap();
        let imported = store.find("77", None).unwrap();
        assert_eq!(imported.name(), Some("Imported"));
        assert_eq!(keys(&store.order().unwrap()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_recent_newest_first() {
        let (_tmp, store) = setup();
        store.add_item("One", Category::Event, None).unwrap();
        store.add_item("Two", Category::Location, None).unwrap();
        store.add_item("Three", Category::Event, None).unwrap();

        let recent = store.recent(Some(2)).unwrap();
        assert_eq!(keys(&recent), vec!["event-three", "location-two"]);
    }

    #[test]
    fn test_search() {
        let (_tmp, store) = setup();
        store.add_item("Harbour Walk", Category::Location, None).unwrap();
        store.add_item("Harvest Dinner", Category::Event, None).unwrap();
        store.add_item("Open Mic", Category::Event, None).unwrap();

        assert_eq!(store.search("HAR", None).unwrap().len(), 2);
        assert_eq!(store.search("har", Some(1)).unwrap().len(), 1);
        assert!(store.search("  ", None).unwrap().is_empty());
    }

    #[test]
    fn test_apply_ranks_and_removes() {
        let (_tmp, store) = ranked_store();
        assert_eq!(keys(&store.order().unwrap()), vec!["a", "b", "c"]);

        // delete a, move c to top
        let mut payload = ChangeSet::new();
        payload.push(Category::Event, ChangeRecord::deleted(key("a")));
        payload.push(Category::Location, ChangeRecord::ranked(key("c"), 1));
        payload.push(Category::Event, ChangeRecord::ranked(key("b"), 2));

        let summary = store.apply(&payload).unwrap();
        assert_eq!(summary, ApplySummary { ranked: 2, removed: 1 });
        assert_eq!(keys(&store.order().unwrap()), vec!["c", "b"]);

        // deleted items stay in the catalog
        assert!(store.find("a", Some(Category::Event)).is_ok());
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let (_tmp, store) = ranked_store();

        let mut payload = ChangeSet::new();
        payload.push(Category::Event, ChangeRecord::ranked(key("b"), 1));
        payload.push(Category::Event, ChangeRecord::ranked(key("missing"), 2));

        let result = store.apply(&payload);
        assert!(matches!(result, Err(StoreError::ItemNotFound(k)) if k == "missing"));
        assert_eq!(keys(&store.order().unwrap()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_apply_rejects_wrong_category_and_bad_records() {
        let (_tmp, store) = ranked_store();

        let mut payload = ChangeSet::new();
        payload.push(Category::Location, ChangeRecord::ranked(key("a"), 1));
        assert!(matches!(
            store.apply(&payload),
            Err(StoreError::CategoryMismatch { .. })
        ));

        let mut payload = ChangeSet::new();
        payload.push(
            Category::Event,
            ChangeRecord {
                key: key("a"),
                new_priority: Some(0),
                is_aggregated: true,
            },
        );
        assert!(matches!(store.apply(&payload), Err(StoreError::Rejected(_))));
    }

    #[test]
    fn test_compaction_prefers_batch_on_ties() {
        let (_tmp, store) = ranked_store();

        // c claims rank 1 without the others being resent
        let mut payload = ChangeSet::new();
        payload.push(Category::Location, ChangeRecord::ranked(key("c"), 1));
        store.apply(&payload).unwrap();

        assert_eq!(keys(&store.order().unwrap()), vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_remote_store_returns_records() {
        let (_tmp, store) = ranked_store();

        let order = store.fetch_aggregated_order().await.unwrap();
        assert_eq!(order.len(), 3);
        assert_eq!(order[2].kind.as_deref(), Some("location"));
        assert_eq!(order[0].key().unwrap().as_str(), "a");

        let found = store.fetch_suggestions("b").await.unwrap();
        assert_eq!(found.len(), 1);
    }
}
