//! Field-level metadata
//!
//! Metadata is a list of `{ "breadcrumb": [...], "metadata": {...} }` entries.
//! The empty breadcrumb addresses the table; `["properties", "<field>"]`
//! addresses a top-level field.

use crate::types::JsonObject;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One metadata entry as it appears in configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Path to the schema node this entry describes
    #[serde(default)]
    pub breadcrumb: Vec<String>,

    /// Metadata values for that node
    #[serde(default)]
    pub metadata: JsonObject,
}

impl MetadataEntry {
    /// Create an entry for a top-level field
    pub fn field(name: &str, metadata: JsonObject) -> Self {
        Self {
            breadcrumb: vec!["properties".to_string(), name.to_string()],
            metadata,
        }
    }
}

/// How a field participates in replication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    /// Always replicated, regardless of selection
    Automatic,
    /// Replicated when selected
    Available,
    /// Never replicated
    Unsupported,
}

/// Metadata entries indexed by breadcrumb
#[derive(Debug, Clone, Default)]
pub struct MetadataMap {
    entries: HashMap<Vec<String>, JsonObject>,
}

impl MetadataMap {
    /// Index a list of entries; later entries win on duplicate breadcrumbs
    pub fn from_entries(entries: &[MetadataEntry]) -> Self {
        let entries = entries
            .iter()
            .map(|e| (e.breadcrumb.clone(), e.metadata.clone()))
            .collect();
        Self { entries }
    }

    /// Check if no metadata was supplied
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn field(&self, name: &str) -> Option<&JsonObject> {
        self.entries
            .get(&["properties".to_string(), name.to_string()][..])
    }

    /// Declared inclusion for a top-level field
    pub fn inclusion(&self, name: &str) -> Option<Inclusion> {
        match self.field(name)?.get("inclusion")?.as_str()? {
            "automatic" => Some(Inclusion::Automatic),
            "available" => Some(Inclusion::Available),
            "unsupported" => Some(Inclusion::Unsupported),
            _ => None,
        }
    }

    /// Declared selection for a top-level field
    pub fn selected(&self, name: &str) -> Option<bool> {
        self.field(name)?.get("selected")?.as_bool()
    }

    /// Whether a field survives metadata filtering
    pub fn keeps(&self, name: &str) -> bool {
        match self.inclusion(name) {
            Some(Inclusion::Automatic) => true,
            Some(Inclusion::Unsupported) => false,
            _ => self.selected(name) != Some(false),
        }
    }
}
