//! Decoder types and traits
//!
//! Defines the core row decoding abstractions.

use crate::config::TableSpec;
use crate::error::Result;
use crate::storage::ByteStream;
use crate::types::JsonObject;

/// Lazy sequence of decoded rows; finite, consumed once, in file order
pub type RowIter = Box<dyn Iterator<Item = Result<JsonObject>> + Send>;

/// Options passed to every decoder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Largest accepted field in bytes; `None` accepts fields of any size
    pub max_field_size: Option<usize>,
}

impl DecodeOptions {
    /// Options accepting fields of any size
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Set a field size limit
    #[must_use]
    pub fn with_max_field_size(mut self, limit: usize) -> Self {
        self.max_field_size = Some(limit);
        self
    }
}

/// Trait for turning a file's bytes into rows
pub trait RowDecoder: Send + Sync {
    /// Name the decoder is registered under
    fn name(&self) -> &str;

    /// Start decoding a file
    ///
    /// Header problems are reported here; row problems are reported by the
    /// returned iterator. `key` is only used in error messages.
    fn rows(
        &self,
        stream: ByteStream,
        table: &TableSpec,
        key: &str,
        options: &DecodeOptions,
    ) -> Result<RowIter>;
}
