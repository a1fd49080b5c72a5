//! Schema-driven record coercion
//!
//! Decoded cells arrive as strings. The transformer converts each field to
//! the first declared type it fits, filters fields by metadata and drops
//! fields the schema does not declare.

use super::metadata::MetadataMap;
use super::types::{JsonType, SchemaProperty};
use crate::error::{Error, Result};
use crate::timestamp::{format_record_datetime, parse_datetime};
use crate::types::{JsonObject, JsonValue};
use serde_json::Number;
use std::collections::BTreeSet;
use tracing::warn;

/// Coerces records to a table schema
///
/// One transformer is used per file so that dropped fields are reported
/// once per file rather than once per record.
#[derive(Debug)]
pub struct Transformer<'a> {
    schema: &'a SchemaProperty,
    metadata: &'a MetadataMap,
    /// Fields removed because the schema does not declare them
    removed: BTreeSet<String>,
    /// Fields removed by metadata (unselected or unsupported)
    filtered: BTreeSet<String>,
}

impl<'a> Transformer<'a> {
    /// Create a transformer for a table schema
    pub fn new(schema: &'a SchemaProperty, metadata: &'a MetadataMap) -> Self {
        Self {
            schema,
            metadata,
            removed: BTreeSet::new(),
            filtered: BTreeSet::new(),
        }
    }

    /// Filter and coerce one record
    pub fn transform(&mut self, record: JsonObject) -> Result<JsonObject> {
        let mut record = record;
        if !self.metadata.is_empty() {
            let metadata = self.metadata;
            let filtered = &mut self.filtered;
            record.retain(|name, _| {
                let keep = metadata.keeps(name);
                if !keep {
                    filtered.insert(name.clone());
                }
                keep
            });
        }

        let schema = self.schema;
        self.transform_object(record, schema, "")
    }

    /// Fields dropped because the schema does not declare them
    pub fn removed_fields(&self) -> &BTreeSet<String> {
        &self.removed
    }

    /// Fields dropped by metadata
    pub fn filtered_fields(&self) -> &BTreeSet<String> {
        &self.filtered
    }

    /// Log the fields this transformer dropped
    pub fn log_warnings(&self) {
        if !self.removed.is_empty() {
            warn!(
                fields = ?self.removed,
                "Removed fields that are not declared in the schema"
            );
        }
        if !self.filtered.is_empty() {
            tracing::debug!(fields = ?self.filtered, "Filtered fields by metadata");
        }
    }

    fn transform_object(
        &mut self,
        object: JsonObject,
        schema: &SchemaProperty,
        path: &str,
    ) -> Result<JsonObject> {
        let Some(properties) = &schema.properties else {
            return Ok(object);
        };
        let pass_unknown = schema.additional_properties == Some(true);

        let mut result = JsonObject::new();
        for (key, value) in object {
            let field_path = join_path(path, &key);
            match properties.get(&key) {
                Some(property) => {
                    let coerced = self.transform_value(value, property, &field_path)?;
                    result.insert(key, coerced);
                }
                None if pass_unknown => {
                    result.insert(key, value);
                }
                None => {
                    self.removed.insert(field_path);
                }
            }
        }
        Ok(result)
    }

    fn transform_value(
        &mut self,
        value: JsonValue,
        schema: &SchemaProperty,
        path: &str,
    ) -> Result<JsonValue> {
        let types = &schema.json_type;

        let value = match value {
            JsonValue::Null if types.is_nullable() => return Ok(JsonValue::Null),
            JsonValue::Null => {
                return Err(Error::transform(path, format!("null is not a {types}")));
            }
            // An empty cell is a missing value wherever null is allowed
            JsonValue::String(s) if s.is_empty() && types.is_nullable() => {
                return Ok(JsonValue::Null);
            }
            other => other,
        };

        for json_type in types.types() {
            let attempt = match json_type {
                JsonType::Null => None,
                JsonType::Integer => to_integer(&value),
                JsonType::Number => to_number(&value),
                JsonType::Boolean => to_boolean(&value),
                JsonType::String if schema.is_date_time() => to_date_time(&value),
                JsonType::String => Some(to_string(&value)),
                JsonType::Object => match to_json_container(&value, JsonType::Object) {
                    Some(JsonValue::Object(object)) => {
                        return self
                            .transform_object(object, schema, path)
                            .map(JsonValue::Object);
                    }
                    _ => None,
                },
                JsonType::Array => match to_json_container(&value, JsonType::Array) {
                    Some(JsonValue::Array(items)) => {
                        return self.transform_array(items, schema, path);
                    }
                    _ => None,
                },
            };
            if let Some(coerced) = attempt {
                return Ok(coerced);
            }
        }

        Err(Error::transform(
            path,
            format!("{} is not a {types}", describe(&value)),
        ))
    }

    fn transform_array(
        &mut self,
        items: Vec<JsonValue>,
        schema: &SchemaProperty,
        path: &str,
    ) -> Result<JsonValue> {
        let Some(item_schema) = schema.items.as_deref() else {
            return Ok(JsonValue::Array(items));
        };
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| self.transform_value(item, item_schema, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(JsonValue::Array)
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn describe(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}

fn to_integer(value: &JsonValue) -> Option<JsonValue> {
    match value {
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
        JsonValue::Number(n) => {
            let f = n.as_f64()?;
            if f.fract() != 0.0 || !f.is_finite() {
                return None;
            }
            Some(JsonValue::Number((f as i64).into()))
        }
        JsonValue::String(s) => s.trim().parse::<i64>().ok().map(|n| JsonValue::Number(n.into())),
        _ => None,
    }
}

fn to_number(value: &JsonValue) -> Option<JsonValue> {
    match value {
        JsonValue::Number(_) => Some(value.clone()),
        JsonValue::String(s) => {
            let f = s.trim().parse::<f64>().ok()?;
            Number::from_f64(f).map(JsonValue::Number)
        }
        _ => None,
    }
}

fn to_boolean(value: &JsonValue) -> Option<JsonValue> {
    match value {
        JsonValue::Bool(_) => Some(value.clone()),
        JsonValue::Number(n) => match n.as_i64()? {
            0 => Some(JsonValue::Bool(false)),
            1 => Some(JsonValue::Bool(true)),
            _ => None,
        },
        JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Some(JsonValue::Bool(true)),
            "false" | "f" | "no" | "n" | "0" => Some(JsonValue::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn to_date_time(value: &JsonValue) -> Option<JsonValue> {
    let JsonValue::String(s) = value else {
        return None;
    };
    parse_datetime(s).map(|dt| JsonValue::String(format_record_datetime(&dt)))
}

fn to_string(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::String(_) => value.clone(),
        other => JsonValue::String(other.to_string()),
    }
}

fn to_json_container(value: &JsonValue, wanted: JsonType) -> Option<JsonValue> {
    let parsed = match value {
        JsonValue::String(s) => serde_json::from_str::<JsonValue>(s).ok()?,
        other => other.clone(),
    };
    match (&parsed, wanted) {
        (JsonValue::Object(_), JsonType::Object) | (JsonValue::Array(_), JsonType::Array) => {
            Some(parsed)
        }
        _ => None,
    }
}
