//! Schema module
//!
//! JSON Schema types for table definitions, field metadata, and the
//! transformer that coerces decoded rows to a table's schema.
//!
//! # Features
//!
//! - **Type Coercion**: String cells to integer, number, boolean, date-time
//! - **Nullable Handling**: Empty cells become null for nullable columns
//! - **Metadata Filtering**: Unselected and unsupported fields are removed
//! - **Undeclared Fields**: Dropped and reported once per file

mod metadata;
mod transform;
mod types;

pub use metadata::{Inclusion, MetadataEntry, MetadataMap};
pub use transform::Transformer;
pub use types::{JsonType, JsonTypeOrArray, SchemaProperty};
