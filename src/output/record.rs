//! Record enrichment and sequencing

use crate::types::{
    JsonObject, JsonValue, SDC_SOURCE_BUCKET_COLUMN, SDC_SOURCE_FILE_COLUMN,
    SDC_SOURCE_LINENO_COLUMN, SEQUENCE_FIELD,
};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Merge a decoded row with its provenance columns
///
/// `row_index` is zero-based over data rows; the header is line 1, so the
/// first data row is line 2. Provenance columns replace data columns of the
/// same name.
pub fn enrich(mut row: JsonObject, bucket: &str, file_key: &str, row_index: usize) -> JsonObject {
    row.insert(
        SDC_SOURCE_BUCKET_COLUMN.to_string(),
        JsonValue::String(bucket.to_string()),
    );
    row.insert(
        SDC_SOURCE_FILE_COLUMN.to_string(),
        JsonValue::String(file_key.to_string()),
    );
    row.insert(
        SDC_SOURCE_LINENO_COLUMN.to_string(),
        JsonValue::from(row_index as u64 + 2),
    );
    row
}

/// A record and the sequence number of the file it came from
///
/// Serializes as the record's fields with `sequence` added; a data field
/// named `sequence` is replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencedRecord {
    /// Coerced record fields
    pub record: JsonObject,
    /// Source file modification time in epoch seconds
    pub sequence: i64,
}

impl SequencedRecord {
    /// Pair a record with a sequence number
    pub fn new(record: JsonObject, sequence: i64) -> Self {
        Self { record, sequence }
    }
}

impl Serialize for SequencedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in self
            .record
            .iter()
            .filter(|(name, _)| name.as_str() != SEQUENCE_FIELD)
        {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry(SEQUENCE_FIELD, &self.sequence)?;
        map.end()
    }
}
