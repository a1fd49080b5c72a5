//! Configuration types for the tap
//!
//! Configuration is read once per run and is immutable afterwards. It may be
//! written as JSON or YAML; `tables` may be a list or a JSON-encoded string
//! holding that list.

use crate::error::{Error, Result};
use crate::schema::{JsonType, MetadataEntry, MetadataMap, SchemaProperty};
use crate::timestamp::parse_datetime;
use crate::types::{
    OptionStringExt, SDC_EXTRA_COLUMN, SDC_SOURCE_BUCKET_COLUMN, SDC_SOURCE_FILE_COLUMN,
    SDC_SOURCE_LINENO_COLUMN,
};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ============================================================================
// Top-Level Tap Config
// ============================================================================

/// Complete tap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// Bucket (or container) holding the files
    pub bucket: String,

    /// Default watermark for tables without a bookmark (ISO-8601)
    #[serde(default)]
    pub start_date: Option<String>,

    /// Name of an alternate row decoder
    #[serde(default)]
    pub encoding_module: Option<String>,

    /// Storage location URL; defaults to `s3://<bucket>`
    #[serde(default)]
    pub storage_url: Option<String>,

    /// Table definitions
    #[serde(default, deserialize_with = "deserialize_tables")]
    pub tables: Vec<TableSpec>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TablesField {
    List(Vec<TableSpec>),
    Encoded(String),
}

fn deserialize_tables<'de, D>(deserializer: D) -> std::result::Result<Vec<TableSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    match TablesField::deserialize(deserializer)? {
        TablesField::List(tables) => Ok(tables),
        TablesField::Encoded(raw) => serde_json::from_str(&raw).map_err(serde::de::Error::custom),
    }
}

impl TapConfig {
    /// Parse a JSON configuration document
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse a YAML configuration document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load configuration from a file; `.yaml`/`.yml` files are read as YAML
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    /// Check the configuration before any I/O happens
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(Error::missing_field("bucket"));
        }

        self.start_date()?;

        let mut seen = HashSet::new();
        for table in &self.tables {
            if !seen.insert(table.table_name.as_str()) {
                return Err(Error::invalid_value(
                    "tables",
                    format!("duplicate table name '{}'", table.table_name),
                ));
            }
            table.validate()?;
        }

        Ok(())
    }

    /// Parsed `start_date`, if configured
    pub fn start_date(&self) -> Result<Option<DateTime<Utc>>> {
        match self.start_date.clone().none_if_empty() {
            None => Ok(None),
            Some(raw) => parse_datetime(&raw)
                .map(Some)
                .ok_or_else(|| Error::invalid_value("start_date", format!("'{raw}' is not ISO-8601"))),
        }
    }

    /// Configured decoder name, ignoring blank values
    pub fn encoding_module(&self) -> Option<String> {
        self.encoding_module.clone().none_if_empty()
    }

    /// Storage location URL
    pub fn storage_url(&self) -> String {
        self.storage_url
            .clone()
            .none_if_empty()
            .unwrap_or_else(|| format!("s3://{}", self.bucket))
    }

    /// Look up a table by name
    pub fn table(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|t| t.table_name == name)
    }

    /// Tables to sync, in configuration order; an empty filter selects all
    pub fn selected_tables(&self, names: &[String]) -> Result<Vec<TableSpec>> {
        if names.is_empty() {
            return Ok(self.tables.clone());
        }
        if let Some(unknown) = names.iter().find(|name| self.table(name).is_none()) {
            return Err(Error::invalid_value(
                "tables",
                format!("no table named '{unknown}'"),
            ));
        }
        Ok(self
            .tables
            .iter()
            .filter(|table| names.contains(&table.table_name))
            .cloned()
            .collect())
    }
}

// ============================================================================
// Table Spec
// ============================================================================

/// One logical table backed by a set of files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSpec {
    /// Stream name used in emitted messages and bookmarks
    pub table_name: String,

    /// Regex matched anywhere in the object key
    pub search_pattern: String,

    /// Key prefix to list under
    #[serde(default)]
    pub search_prefix: Option<String>,

    /// Columns forming the primary key; must be present in every header
    #[serde(default)]
    pub key_properties: Vec<String>,

    /// Columns coerced as `date-time`; must be present in every header
    #[serde(default)]
    pub date_overrides: Vec<String>,

    /// Single-character field delimiter (default `,`)
    #[serde(default)]
    pub delimiter: Option<String>,

    /// Declared JSON schema; when absent, data columns pass through as text
    #[serde(default)]
    pub schema: Option<SchemaProperty>,

    /// Field-level metadata
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

impl TableSpec {
    /// Create a table spec with defaults
    pub fn new(table_name: impl Into<String>, search_pattern: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            search_pattern: search_pattern.into(),
            search_prefix: None,
            key_properties: Vec::new(),
            date_overrides: Vec::new(),
            delimiter: None,
            schema: None,
            metadata: Vec::new(),
        }
    }

    /// Set the declared schema
    #[must_use]
    pub fn with_schema(mut self, schema: SchemaProperty) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Set the listing prefix
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.search_prefix = Some(prefix.into());
        self
    }

    /// Check the table definition
    pub fn validate(&self) -> Result<()> {
        if self.table_name.trim().is_empty() {
            return Err(Error::missing_field("table_name"));
        }
        self.pattern()?;
        self.delimiter_byte()?;
        Ok(())
    }

    /// Compiled search pattern
    pub fn pattern(&self) -> Result<Regex> {
        Regex::new(&self.search_pattern).map_err(|source| Error::InvalidPattern {
            pattern: self.search_pattern.clone(),
            source,
        })
    }

    /// Delimiter as a single byte
    pub fn delimiter_byte(&self) -> Result<u8> {
        let Some(raw) = self.delimiter.as_deref().filter(|d| !d.is_empty()) else {
            return Ok(b',');
        };
        let raw = if raw == "\\t" { "\t" } else { raw };
        match raw.as_bytes() {
            [byte] => Ok(*byte),
            _ => Err(Error::invalid_value(
                "delimiter",
                format!("'{raw}' must be a single ASCII character"),
            )),
        }
    }

    /// Field metadata indexed by breadcrumb
    pub fn metadata_map(&self) -> MetadataMap {
        MetadataMap::from_entries(&self.metadata)
    }

    /// Schema records are coerced against and announced with
    ///
    /// Adds the reserved provenance columns and marks `date_overrides`
    /// columns as nullable `date-time` strings.
    pub fn effective_schema(&self) -> SchemaProperty {
        let mut schema = self.schema.clone().unwrap_or_default();

        for column in &self.date_overrides {
            schema.set_property(
                column,
                SchemaProperty::nullable(JsonType::String).with_format("date-time"),
            );
        }

        schema.set_property(
            SDC_SOURCE_BUCKET_COLUMN,
            SchemaProperty::new(JsonType::String),
        );
        schema.set_property(SDC_SOURCE_FILE_COLUMN, SchemaProperty::new(JsonType::String));
        schema.set_property(
            SDC_SOURCE_LINENO_COLUMN,
            SchemaProperty::new(JsonType::Integer),
        );
        let mut extra = SchemaProperty::array(SchemaProperty::new(JsonType::String));
        extra.make_nullable();
        schema.set_property(SDC_EXTRA_COLUMN, extra);

        schema
    }
}
