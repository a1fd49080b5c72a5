//! Output module
//!
//! Builds and writes the message stream.
//!
//! # Overview
//!
//! This module provides:
//! - `Message` - SCHEMA, RECORD and STATE protocol messages
//! - `SequencedRecord` - A record paired with its file-granular sequence
//! - `enrich` - Adds provenance columns to a decoded row
//! - `MessageSink` - Destination for messages (`JsonLinesWriter`, `Vec<Message>`)

mod message;
mod record;
mod writer;

pub use message::Message;
pub use record::{enrich, SequencedRecord};
pub use writer::{JsonLinesWriter, MessageSink};

#[cfg(test)]
mod tests;
