//! Common types used throughout the tap
//!
//! Shared type aliases and the reserved column names stamped onto
//! every record.

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type; one decoded row or one record
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Reserved Columns
// ============================================================================

/// Bucket (or container) the record was read from
pub const SDC_SOURCE_BUCKET_COLUMN: &str = "_sdc_source_bucket";

/// Object key of the file the record was read from
pub const SDC_SOURCE_FILE_COLUMN: &str = "_sdc_source_file";

/// 1-based line number of the record; the header is line 1
pub const SDC_SOURCE_LINENO_COLUMN: &str = "_sdc_source_lineno";

/// Values past the end of the header row
pub const SDC_EXTRA_COLUMN: &str = "_sdc_extra";

/// Field injected into every emitted record by the sequencer
pub const SEQUENCE_FIELD: &str = "sequence";

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.trim().is_empty())
    }
}
