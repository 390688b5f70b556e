//! Messages exchanged between the editor and a UI shell.

use crate::change::ChangeSet;
use crate::error::{CoreError, Result};
use crate::item::{Category, Item, ItemKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An operator action sent to an editing session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditorCommand {
    /// Insert an already-validated item at the top.
    Insert { item: Item },
    /// Insert the n-th entry of the latest suggestions.
    InsertSuggestion { index: usize },
    /// Insert the n-th entry of the recently-added list.
    InsertRecent { index: usize },
    /// Delete the item at a working-list index.
    Delete { index: usize },
    /// Drag-and-drop move.
    Move { from: usize, to: usize },
    /// Free-text search; later searches supersede earlier ones.
    Search { query: String },
    /// Send pending changes to the remote store.
    Commit,
    /// Discard the session without sending anything.
    Close,
}

impl EditorCommand {
    /// Short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::InsertSuggestion { .. } => "insert_suggestion",
            Self::InsertRecent { .. } => "insert_recent",
            Self::Delete { .. } => "delete",
            Self::Move { .. } => "move",
            Self::Search { .. } => "search",
            Self::Commit => "commit",
            Self::Close => "close",
        }
    }
}

/// A notification from an editing session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EditorEvent {
    /// Initial lists are in place.
    Loaded {
        working: Vec<Item>,
        recent: Vec<Item>,
    },
    /// The working list or pending changes changed.
    Changed {
        working: Vec<Item>,
        has_changes: bool,
        payload: ChangeSet,
    },
    /// Results for the most recent search.
    Suggestions { query: String, items: Vec<Item> },
    /// A command could not be applied.
    Rejected { command: String, reason: String },
    CommitStarted { payload: ChangeSet },
    /// Commit requested while another was in flight.
    CommitIgnored,
    /// Changes applied; the session is over.
    Committed,
    /// Remote store refused or failed; edits are kept for retry.
    CommitFailed { reason: String },
    Closed,
}

/// Textual edit operation, e.g. `ins:evt-12`, `ins:location:harbour`,
/// `del:3`, `mv:4:0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    /// Insert by key, optionally qualified by category.
    Insert {
        category: Option<Category>,
        key: ItemKey,
    },
    Delete(usize),
    Move { from: usize, to: usize },
}

impl EditOp {
    /// Parse an operation string.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidOperation` if the format is invalid.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || CoreError::InvalidOperation(input.to_string());
        let (op, rest) = input.trim().split_once(':').ok_or_else(invalid)?;

        let index = |s: &str| s.trim().parse::<usize>().map_err(|_| invalid());

        match op.trim() {
            "ins" | "insert" => {
                let qualified = rest.split_once(':').and_then(|(kind, key)| {
                    kind.parse::<Category>().ok().map(|category| (category, key))
                });
                Ok(match qualified {
                    Some((category, key)) => Self::Insert {
                        category: Some(category),
                        key: ItemKey::new(key)?,
                    },
                    None => Self::Insert {
                        category: None,
                        key: ItemKey::new(rest)?,
                    },
                })
            }
            "del" | "delete" => Ok(Self::Delete(index(rest)?)),
            "mv" | "move" => {
                let (from, to) = rest.split_once(':').ok_or_else(invalid)?;
                Ok(Self::Move {
                    from: index(from)?,
                    to: index(to)?,
                })
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for EditOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert {
                category: Some(category),
                key,
            } => write!(f, "ins:{category}:{key}"),
            Self::Insert { category: None, key } => write!(f, "ins:{key}"),
            Self::Delete(index) => write!(f, "del:{index}"),
            Self::Move { from, to } => write!(f, "mv:{from}:{to}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_op_parse() {
        assert_eq!(
            EditOp::parse("ins:evt-12").unwrap(),
            EditOp::Insert {
                category: None,
                key: ItemKey::new("evt-12").unwrap(),
            }
        );
        assert_eq!(EditOp::parse("del:3").unwrap(), EditOp::Delete(3));
        assert_eq!(
            EditOp::parse(" mv: 4 : 0 ").unwrap(),
            EditOp::Move { from: 4, to: 0 }
        );
        assert_eq!(EditOp::parse("mv:1:2").unwrap().to_string(), "mv:1:2");
    }

    #[test]
    fn test_edit_op_parse_errors() {
        assert!(matches!(EditOp::parse("del"), Err(CoreError::InvalidOperation(_))));
        assert!(matches!(EditOp::parse("del:-1"), Err(CoreError::InvalidOperation(_))));
        assert!(matches!(EditOp::parse("mv:1"), Err(CoreError::InvalidOperation(_))));
        assert!(matches!(EditOp::parse("swap:1:2"), Err(CoreError::InvalidOperation(_))));
        assert!(matches!(EditOp::parse("ins:"), Err(CoreError::InvalidKey(_))));
        assert!(matches!(EditOp::parse("ins:event:"), Err(CoreError::InvalidKey(_))));
    }

    #[test]
    fn test_edit_op_parse_category_prefix() {
        let op = EditOp::parse("ins:Locations:harbour").unwrap();
        assert_eq!(
            op,
            EditOp::Insert {
                category: Some(Category::Location),
                key: ItemKey::new("harbour").unwrap(),
            }
        );
        assert_eq!(op.to_string(), "ins:location:harbour");

        // an unknown prefix stays part of the key
        assert_eq!(
            EditOp::parse("ins:venue:12").unwrap(),
            EditOp::Insert {
                category: None,
                key: ItemKey::new("venue:12").unwrap(),
            }
        );
    }

    #[test]
    fn test_command_serialization() {
        let cmd = EditorCommand::Move { from: 2, to: 0 };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains(r#""op":"move""#));

        let cmd: EditorCommand = serde_json::from_str(
            r#"{"op":"insert","item":{"key":"D","category":"event","fields":{"name":"Demo"}}}"#,
        )
        .unwrap();
        match cmd {
            EditorCommand::Insert { item } => {
                assert_eq!(item.category(), Category::Event);
                assert_eq!(item.name(), Some("Demo"));
            }
            other => panic!("Expected Insert, got {other:?}"),
        }

        let cmd: EditorCommand = serde_json::from_str(r#"{"op":"commit"}"#).unwrap();
        assert_eq!(cmd, EditorCommand::Commit);
    }
}
