//! State types for tracking replication progress
//!
//! These types are serialized to JSON and persisted between runs:
//!
//! ```json
//! { "bookmarks": { "orders": { "modified_since": "2020-03-01T00:00:00+00:00" } } }
//! ```
//!
//! Keys this crate does not know about are carried through unchanged.

use crate::types::{JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bookmark key holding a table's watermark
pub const MODIFIED_SINCE: &str = "modified_since";

/// Complete state for a tap run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-table bookmarks
    #[serde(default)]
    pub bookmarks: BTreeMap<String, Bookmark>,

    /// Other top-level keys, preserved as-is
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the bookmark for a table
    pub fn get_bookmark(&self, table: &str) -> Option<&Bookmark> {
        self.bookmarks.get(table)
    }

    /// Get a mutable bookmark for a table, creating if needed
    pub fn get_bookmark_mut(&mut self, table: &str) -> &mut Bookmark {
        self.bookmarks.entry(table.to_string()).or_default()
    }

    /// Get a table's watermark string
    pub fn modified_since(&self, table: &str) -> Option<&str> {
        self.bookmarks.get(table)?.modified_since.as_deref()
    }

    /// Set a table's watermark string
    pub fn set_modified_since(&mut self, table: &str, value: String) {
        self.get_bookmark_mut(table).modified_since = Some(value);
    }

    /// Read any bookmark value
    pub fn get_value(&self, table: &str, key: &str) -> Option<JsonValue> {
        let bookmark = self.bookmarks.get(table)?;
        if key == MODIFIED_SINCE {
            return bookmark.modified_since.clone().map(JsonValue::String);
        }
        bookmark.extra.get(key).cloned()
    }
}

/// Bookmark for a single table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Modification time of the last fully emitted file (ISO-8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_since: Option<String>,

    /// Other bookmark keys, preserved as-is
    #[serde(flatten)]
    pub extra: JsonObject,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_state_default() {
        let state = State::new();
        assert!(state.bookmarks.is_empty());
        assert_eq!(serde_json::to_value(&state).unwrap(), json!({"bookmarks": {}}));
    }

    #[test]
    fn test_state_modified_since() {
        let mut state = State::new();
        assert!(state.modified_since("orders").is_none());

        state.set_modified_since("orders", "2020-02-01T00:00:00+00:00".to_string());
        assert_eq!(
            state.modified_since("orders"),
            Some("2020-02-01T00:00:00+00:00")
        );
        assert_eq!(
            state.get_value("orders", MODIFIED_SINCE),
            Some(json!("2020-02-01T00:00:00+00:00"))
        );
    }

    #[test]
    fn test_state_preserves_unknown_keys() {
        let raw = json!({
            "currently_syncing": "orders",
            "bookmarks": {
                "orders": {"modified_since": "2020-01-01T00:00:00+00:00", "version": 3}
            }
        });
        let state: State = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(state.get_value("orders", "version"), Some(json!(3)));
        assert_eq!(serde_json::to_value(&state).unwrap(), raw);
    }

    #[test]
    fn test_state_missing_bookmarks_key() {
        let state: State = serde_json::from_str("{}").unwrap();
        assert!(state.bookmarks.is_empty());
    }
}
