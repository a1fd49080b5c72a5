//! Decoder registry
//!
//! Resolves the decoder named in configuration. An unknown name is not an
//! error: the registry logs a warning and hands back the default decoder.

use super::decoders::{CsvRowDecoder, JsonlRowDecoder};
use super::types::RowDecoder;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Outcome of resolving a decoder name
#[derive(Clone)]
pub struct Resolved {
    /// Decoder to use
    pub decoder: Arc<dyn RowDecoder>,
    /// Whether the requested decoder was missing and the default was used
    pub fell_back: bool,
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolved")
            .field("decoder", &self.decoder.name())
            .field("fell_back", &self.fell_back)
            .finish()
    }
}

/// Named row decoders plus the default
#[derive(Clone)]
pub struct DecoderRegistry {
    decoders: BTreeMap<String, Arc<dyn RowDecoder>>,
    default: Arc<dyn RowDecoder>,
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DecoderRegistry {
    /// Registry with the built-in decoders; `csv` is the default
    pub fn new() -> Self {
        let mut registry = Self::with_default(Arc::new(CsvRowDecoder::new()));
        registry.register(Arc::new(JsonlRowDecoder::new()));
        registry
    }

    /// Registry containing only the given default decoder
    pub fn with_default(default: Arc<dyn RowDecoder>) -> Self {
        let mut decoders = BTreeMap::new();
        decoders.insert(default.name().to_string(), Arc::clone(&default));
        Self { decoders, default }
    }

    /// Add a decoder under its own name, replacing any previous one
    pub fn register(&mut self, decoder: Arc<dyn RowDecoder>) {
        self.decoders.insert(decoder.name().to_string(), decoder);
    }

    /// Look up a decoder by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn RowDecoder>> {
        self.decoders.get(name).cloned()
    }

    /// Registered decoder names
    pub fn names(&self) -> Vec<&str> {
        self.decoders.keys().map(String::as_str).collect()
    }

    /// The default decoder
    pub fn default_decoder(&self) -> Arc<dyn RowDecoder> {
        Arc::clone(&self.default)
    }

    /// Resolve a configured decoder name, falling back to the default
    pub fn resolve(&self, name: Option<&str>) -> Resolved {
        let Some(name) = name else {
            return Resolved {
                decoder: self.default_decoder(),
                fell_back: false,
            };
        };

        match self.get(name) {
            Some(decoder) => Resolved {
                decoder,
                fell_back: false,
            },
            None => {
                warn!(
                    requested = name,
                    available = ?self.names(),
                    "Failed to load encoding module [{name}]. Defaulting to [{}]",
                    self.default.name()
                );
                Resolved {
                    decoder: self.default_decoder(),
                    fell_back: true,
                }
            }
        }
    }
}
