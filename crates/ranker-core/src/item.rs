//! Rankable item model and raw record ingestion.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Closed set of rankable categories. Each category has its own bucket in a change set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Event,
    Location,
}

impl Category {
    /// All categories, in payload order.
    pub const ALL: [Self; 2] = [Self::Event, Self::Location];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Location => "location",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "event" | "events" => Ok(Self::Event),
            "location" | "locations" => Ok(Self::Location),
            other => Err(CoreError::UnknownCategory(other.to_string())),
        }
    }
}

/// Stable identity of an item within its category. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemKey(String);

impl ItemKey {
    /// Build a key, rejecting blank input.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidKey` if the key is empty after trimming.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            return Err(CoreError::InvalidKey("key cannot be empty".into()));
        }
        Ok(Self(key))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive a key from a JSON identity value (string or integer).
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Self::new(s.as_str()),
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::new(n.to_string()),
            other => Err(CoreError::InvalidKey(format!(
                "expected string or integer, got {other}"
            ))),
        }
    }
}

impl TryFrom<String> for ItemKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ItemKey> for String {
    fn from(key: ItemKey) -> Self {
        key.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A record as delivered by an external source, before validation.
///
/// Sources disagree on shape: some carry `uid`, some only `id`, and `id` may be
/// numeric. Everything besides identity and `type` is display data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    /// Category tag (`event` / `location`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RawRecord {
    /// Resolve the identity key: `uid` when present and non-blank, else `id`.
    ///
    /// # Errors
    /// Returns `CoreError::MissingKey` when neither field is usable.
    pub fn key(&self) -> Result<ItemKey> {
        let uid = self.uid.as_ref().filter(|v| match v {
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        });

        match (uid, &self.id) {
            (Some(uid), _) => ItemKey::from_value(uid),
            (None, Some(id)) => ItemKey::from_value(id),
            (None, None) => Err(CoreError::MissingKey),
        }
    }
}

/// A validated, rankable entity. Key and category are fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    key: ItemKey,
    category: Category,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    fields: Map<String, Value>,
}

impl Item {
    #[must_use]
    pub fn new(key: ItemKey, category: Category) -> Self {
        Self {
            key,
            category,
            fields: Map::new(),
        }
    }

    /// Set a display field value.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub const fn key(&self) -> &ItemKey {
        &self.key
    }

    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Opaque display fields (name, icon, flag, ...).
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Display name, if the source supplied one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    /// Whether this item and `other` denote the same entity.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        self.category == other.category && self.key == other.key
    }

    /// Validate and normalize a raw record.
    ///
    /// # Errors
    /// Returns an error if the record has no usable key or category.
    pub fn from_record(record: RawRecord) -> Result<Self> {
        let key = record.key()?;
        let category = match record.kind.as_deref() {
            Some(kind) => kind.parse()?,
            None => return Err(CoreError::MissingCategory(key.to_string())),
        };

        let mut fields = record.fields;
        // Identity lives in `key`; don't let a stale copy ride along in display data.
        fields.remove("uid");
        fields.remove("id");

        Ok(Self {
            key,
            category,
            fields,
        })
    }

    /// Convert back into the external record shape.
    #[must_use]
    pub fn to_record(&self) -> RawRecord {
        RawRecord {
            uid: Some(Value::String(self.key.to_string())),
            id: None,
            kind: Some(self.category.to_string()),
            fields: self.fields.clone(),
        }
    }
}

/// Normalize a batch of records, dropping malformed ones.
///
/// Returns the accepted items and the number of rejected records. Duplicate
/// identities keep their first occurrence.
pub fn normalize_all(records: impl IntoIterator<Item = RawRecord>) -> (Vec<Item>, usize) {
    let mut items: Vec<Item> = Vec::new();
    let mut rejected = 0;

    for record in records {
        match Item::from_record(record) {
            Ok(item) if items.iter().any(|i| i.same_identity(&item)) => {
                warn!(key = %item.key(), category = %item.category(), "Duplicate record, skipping");
                rejected += 1;
            }
            Ok(item) => items.push(item),
            Err(e) => {
                warn!(error = %e, "Malformed record, skipping");
                rejected += 1;
            }
        }
    }

    (items, rejected)
}
