//! Row decoder module
//!
//! Supports: CSV (default), JSONL
//!
//! # Overview
//!
//! The decode module turns a file's bytes into a lazy sequence of field
//! mappings. Decoders are chosen by name through a registry, so an
//! alternate format can be configured per run. `spawn_rows` runs a decoder
//! on a blocking thread for async callers.

mod decoders;
mod registry;
mod task;
mod types;

pub use decoders::{CsvRowDecoder, JsonlRowDecoder};
pub use registry::{DecoderRegistry, Resolved};
pub use task::{spawn_rows, RowChannel};
pub use types::{DecodeOptions, RowDecoder, RowIter};
