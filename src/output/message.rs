//! Protocol messages
//!
//! Every message serializes to one JSON object tagged by `type`.

use super::record::SequencedRecord;
use crate::schema::SchemaProperty;
use crate::state::State;
use crate::types::JsonObject;
use serde::Serialize;

/// A message written to the output stream
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Message {
    /// Announces a table's schema before its records
    Schema {
        /// Table name
        stream: String,
        /// Effective table schema
        schema: SchemaProperty,
        /// Primary key columns
        key_properties: Vec<String>,
    },
    /// One coerced record
    Record {
        /// Table name
        stream: String,
        /// Record fields plus `sequence`
        record: SequencedRecord,
    },
    /// Full state after a commit
    State {
        /// State object
        value: State,
    },
}

impl Message {
    /// Create a schema message
    pub fn schema(
        stream: impl Into<String>,
        schema: SchemaProperty,
        key_properties: Vec<String>,
    ) -> Self {
        Self::Schema {
            stream: stream.into(),
            schema,
            key_properties,
        }
    }

    /// Create a record message
    pub fn record(stream: impl Into<String>, record: SequencedRecord) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
        }
    }

    /// Create a state message
    pub fn state(value: State) -> Self {
        Self::State { value }
    }

    /// Check if this is a schema message
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Stream name, for messages that carry one
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => Some(stream),
            Self::State { .. } => None,
        }
    }

    /// Record fields (without `sequence`), for record messages
    pub fn record_fields(&self) -> Option<&JsonObject> {
        match self {
            Self::Record { record, .. } => Some(&record.record),
            _ => None,
        }
    }
}
