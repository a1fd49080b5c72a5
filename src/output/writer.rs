//! Message sinks
//!
//! Messages are written one per line as JSON.

use super::message::Message;
use crate::error::{Error, Result};
use std::io::{BufWriter, Stdout, Write};

/// Destination for protocol messages
pub trait MessageSink: Send {
    /// Write one message
    fn emit(&mut self, message: &Message) -> Result<()>;

    /// Flush buffered output
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Collects messages in memory
impl MessageSink for Vec<Message> {
    fn emit(&mut self, message: &Message) -> Result<()> {
        self.push(message.clone());
        Ok(())
    }
}

/// Writes newline-delimited JSON messages
///
/// Output is flushed after every STATE message so a reader never sees a
/// bookmark before the records it covers.
pub struct JsonLinesWriter<W: Write + Send> {
    writer: W,
    pretty: bool,
    written: usize,
}

impl JsonLinesWriter<BufWriter<Stdout>> {
    /// Writer over buffered standard output
    pub fn stdout() -> Self {
        Self::new(BufWriter::new(std::io::stdout()))
    }
}

impl<W: Write + Send> JsonLinesWriter<W> {
    /// Create a writer
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: false,
            written: 0,
        }
    }

    /// Pretty-print each message (multi-line; for reading, not piping)
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Number of messages written
    pub fn written(&self) -> usize {
        self.written
    }

    /// Unwrap the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> MessageSink for JsonLinesWriter<W> {
    fn emit(&mut self, message: &Message) -> Result<()> {
        let line = if self.pretty {
            serde_json::to_string_pretty(message)
        } else {
            serde_json::to_string(message)
        }
        .map_err(|e| Error::output(format!("Failed to serialize message: {e}")))?;

        writeln!(self.writer, "{line}")
            .map_err(|e| Error::output(format!("Failed to write message: {e}")))?;
        self.written += 1;

        if message.is_state() {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| Error::output(format!("Failed to flush output: {e}")))
    }
}
