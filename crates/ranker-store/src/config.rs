//! Store configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Store configuration stored in `.ranker/config.yml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Configuration version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Store settings.
    #[serde(default)]
    pub store: StoreSettings,

    /// Editing session settings.
    #[serde(default)]
    pub editor: EditorSettings,
}

fn default_version() -> u32 {
    1
}

/// Store-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Store name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Settings for editing sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// How many recently-added items to offer for quick insertion.
    #[serde(default = "default_recent_display_count")]
    pub recent_display_count: usize,

    /// Quiet period before a search is sent.
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Maximum suggestions kept per search.
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
}

const fn default_recent_display_count() -> usize {
    4
}

const fn default_search_debounce_ms() -> u64 {
    300
}

const fn default_suggestion_limit() -> usize {
    10
}

impl EditorSettings {
    #[must_use]
    pub const fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            recent_display_count: default_recent_display_count(),
            search_debounce_ms: default_search_debounce_ms(),
            suggestion_limit: default_suggestion_limit(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            version: 1,
            store: StoreSettings::default(),
            editor: EditorSettings::default(),
        }
    }
}

impl StoreConfig {
    /// Create a new config with the given store name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            store: StoreSettings {
                name: Some(name.into()),
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: StoreConfig =
            serde_yaml::from_str("editor:\n  search_debounce_ms: 50\n").unwrap();

        assert_eq!(config.version, 1);
        assert_eq!(config.editor.search_debounce(), Duration::from_millis(50));
        assert_eq!(config.editor.recent_display_count, 4);
        assert_eq!(config.editor.suggestion_limit, 10);
        assert!(config.store.name.is_none());
    }
}
