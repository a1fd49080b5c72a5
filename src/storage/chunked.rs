//! Blocking reader over an async chunk stream
//!
//! Object bodies arrive as a stream of byte chunks. A background task pulls
//! the stream into a bounded channel and [`ChunkReader`] hands the chunks to
//! synchronous decoders, so only a few chunks are held at a time.

use bytes::{Buf, Bytes};
use futures::{Stream, StreamExt};
use std::io::{self, Read};
use tokio::sync::mpsc;

/// Chunks buffered between the fetch task and the reader
const CHUNK_CHANNEL_CAPACITY: usize = 8;

/// `Read` over chunks fetched by a background task
///
/// Reads block until the next chunk arrives, so the reader must be used from
/// a blocking thread (for example inside `spawn_blocking`), never directly on
/// an async task.
#[derive(Debug)]
pub struct ChunkReader {
    chunks: mpsc::Receiver<io::Result<Bytes>>,
    current: Bytes,
}

impl ChunkReader {
    /// Start fetching `stream` on the current runtime
    ///
    /// Fetching stops at the first error, which is returned by the next read.
    /// Dropping the reader stops the fetch task.
    pub fn spawn<S, E>(mut stream: S) -> Self
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send + Unpin + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        let (chunk_tx, chunk_rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(io::Error::other);
                let failed = chunk.is_err();
                if chunk_tx.send(chunk).await.is_err() || failed {
                    break; // reader dropped, or nothing more to fetch
                }
            }
        });

        Self {
            chunks: chunk_rx,
            current: Bytes::new(),
        }
    }
}

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while !self.current.has_remaining() {
            match self.chunks.blocking_recv() {
                Some(Ok(chunk)) => self.current = chunk,
                Some(Err(e)) => return Err(e),
                None => return Ok(0),
            }
        }

        let n = buf.len().min(self.current.remaining());
        self.current.copy_to_slice(&mut buf[..n]);
        Ok(n)
    }
}
