//! Decoding on a blocking thread
//!
//! Decoders read synchronously, and a streamed object body blocks while it
//! waits for the next chunk. Rows are therefore decoded inside
//! `spawn_blocking` and handed back through a bounded channel.

use super::types::{DecodeOptions, RowDecoder};
use crate::config::TableSpec;
use crate::error::{Error, Result};
use crate::storage::ByteStream;
use crate::types::JsonObject;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Rows buffered between the decoding thread and the engine
const ROW_CHANNEL_CAPACITY: usize = 256;

/// Receiving end of a file being decoded on a blocking thread
pub struct RowChannel {
    rows: mpsc::Receiver<Result<JsonObject>>,
    task: Option<JoinHandle<()>>,
    key: String,
}

/// Start decoding `stream` on a blocking thread
///
/// Decoding stops after the first error, which is the last item received.
/// Dropping the channel stops the decoder at its next row.
pub fn spawn_rows(
    decoder: Arc<dyn RowDecoder>,
    stream: ByteStream,
    table: TableSpec,
    key: String,
    options: DecodeOptions,
) -> RowChannel {
    let (row_tx, row_rx) = mpsc::channel(ROW_CHANNEL_CAPACITY);
    let task_key = key.clone();

    let task = tokio::task::spawn_blocking(move || {
        let rows = match decoder.rows(stream, &table, &task_key, &options) {
            Ok(rows) => rows,
            Err(e) => {
                let _ = row_tx.blocking_send(Err(e));
                return;
            }
        };
        for row in rows {
            let failed = row.is_err();
            if row_tx.blocking_send(row).is_err() || failed {
                break; // receiver dropped, or the file is unreadable past here
            }
        }
    });

    RowChannel {
        rows: row_rx,
        task: Some(task),
        key,
    }
}

impl RowChannel {
    /// Next decoded row, in file order
    ///
    /// Once the rows run out the decoding thread is joined; a panic there is
    /// reported as a decode error instead of a clean end of file.
    pub async fn next(&mut self) -> Option<Result<JsonObject>> {
        if let Some(row) = self.rows.recv().await {
            return Some(row);
        }
        let task = self.task.take()?;
        match task.await {
            Ok(()) => None,
            Err(e) => Some(Err(Error::decode(
                &self.key,
                format!("decoder task failed: {e}"),
            ))),
        }
    }
}
