//! Schema types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// JSON Schema type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl std::fmt::Display for JsonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonType::String => write!(f, "string"),
            JsonType::Number => write!(f, "number"),
            JsonType::Integer => write!(f, "integer"),
            JsonType::Boolean => write!(f, "boolean"),
            JsonType::Object => write!(f, "object"),
            JsonType::Array => write!(f, "array"),
            JsonType::Null => write!(f, "null"),
        }
    }
}

/// JSON type can be a single type or array of types (for nullable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonTypeOrArray {
    Single(JsonType),
    Multiple(Vec<JsonType>),
}

impl JsonTypeOrArray {
    /// Create a single type
    pub fn single(t: JsonType) -> Self {
        JsonTypeOrArray::Single(t)
    }

    /// Create a nullable type
    pub fn nullable(t: JsonType) -> Self {
        if t == JsonType::Null {
            JsonTypeOrArray::Single(JsonType::Null)
        } else {
            JsonTypeOrArray::Multiple(vec![JsonType::Null, t])
        }
    }

    /// All declared types, in declaration order
    pub fn types(&self) -> &[JsonType] {
        match self {
            JsonTypeOrArray::Single(t) => std::slice::from_ref(t),
            JsonTypeOrArray::Multiple(types) => types,
        }
    }

    /// Check if a type is declared
    pub fn contains(&self, t: JsonType) -> bool {
        self.types().contains(&t)
    }

    /// Check if this type is nullable
    pub fn is_nullable(&self) -> bool {
        self.contains(JsonType::Null)
    }

    /// Get the primary (non-null) type
    pub fn primary_type(&self) -> Option<JsonType> {
        self.types().iter().copied().find(|t| *t != JsonType::Null)
    }

    /// Make this type nullable
    pub fn make_nullable(&self) -> Self {
        if self.is_nullable() {
            return self.clone();
        }
        let mut types = vec![JsonType::Null];
        types.extend_from_slice(self.types());
        JsonTypeOrArray::Multiple(types)
    }
}

impl std::fmt::Display for JsonTypeOrArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.types().iter().map(ToString::to_string).collect();
        write!(f, "{}", names.join("|"))
    }
}

/// JSON Schema property definition
///
/// The top-level table schema is itself a `SchemaProperty` of type object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaProperty {
    /// Property type(s)
    #[serde(rename = "type")]
    pub json_type: JsonTypeOrArray,

    /// Description (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Format hint (e.g., "date-time")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Nested properties (for objects)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, SchemaProperty>>,

    /// Additional properties allowed (for objects)
    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<bool>,

    /// Array items schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaProperty>>,
}

impl SchemaProperty {
    /// Create a new property with the given type
    pub fn new(json_type: JsonType) -> Self {
        Self::with_type(JsonTypeOrArray::single(json_type))
    }

    /// Create a nullable property
    pub fn nullable(json_type: JsonType) -> Self {
        Self::with_type(JsonTypeOrArray::nullable(json_type))
    }

    fn with_type(json_type: JsonTypeOrArray) -> Self {
        Self {
            json_type,
            description: None,
            format: None,
            properties: None,
            additional_properties: None,
            items: None,
        }
    }

    /// Create an object property with nested properties
    pub fn object(properties: BTreeMap<String, SchemaProperty>) -> Self {
        Self {
            properties: Some(properties),
            ..Self::new(JsonType::Object)
        }
    }

    /// Create an object property that accepts any fields unchanged
    pub fn open_object() -> Self {
        Self {
            additional_properties: Some(true),
            ..Self::new(JsonType::Object)
        }
    }

    /// Create an array property with item schema
    pub fn array(items: SchemaProperty) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::new(JsonType::Array)
        }
    }

    /// Set format hint
    #[must_use]
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    /// Make this property nullable
    pub fn make_nullable(&mut self) {
        self.json_type = self.json_type.make_nullable();
    }

    /// Check if nullable
    pub fn is_nullable(&self) -> bool {
        self.json_type.is_nullable()
    }

    /// Check if this is a `date-time` formatted property
    pub fn is_date_time(&self) -> bool {
        self.format.as_deref() == Some("date-time")
    }

    /// Get a nested property
    pub fn get_property(&self, name: &str) -> Option<&SchemaProperty> {
        self.properties.as_ref()?.get(name)
    }

    /// Insert a nested property, creating the property map if needed
    pub fn set_property(&mut self, name: &str, property: SchemaProperty) {
        self.properties
            .get_or_insert_with(BTreeMap::new)
            .insert(name.to_string(), property);
    }
}

impl Default for SchemaProperty {
    fn default() -> Self {
        Self::open_object()
    }
}
