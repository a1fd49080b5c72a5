//! Storage types and traits
//!
//! Defines the storage capability the selector and orchestrator depend on.

use crate::error::Result;
use crate::timestamp::sequence_of;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::io::Read;

/// Readable contents of one object
pub type ByteStream = Box<dyn Read + Send>;

/// Metadata of one stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDescriptor {
    /// Object key
    pub key: String,
    /// Last modification time
    pub last_modified: DateTime<Utc>,
    /// Size in bytes
    pub size: u64,
}

impl FileDescriptor {
    /// Create a descriptor
    pub fn new(key: impl Into<String>, last_modified: DateTime<Utc>, size: u64) -> Self {
        Self {
            key: key.into(),
            last_modified,
            size,
        }
    }

    /// Replication sequence shared by every record of this file
    pub fn sequence(&self) -> i64 {
        sequence_of(&self.last_modified)
    }

    /// Replay order: modification time ascending, then key
    pub fn replay_cmp(&self, other: &Self) -> Ordering {
        self.last_modified
            .cmp(&other.last_modified)
            .then_with(|| self.key.cmp(&other.key))
    }
}

/// Trait for object storage backends
#[async_trait]
pub trait FileStore: Send + Sync {
    /// List every object whose key starts with `prefix` (all objects if `None`)
    async fn list(&self, prefix: Option<&str>) -> Result<Vec<FileDescriptor>>;

    /// Open an object for reading
    ///
    /// The reader may block while the body streams in; read it from a
    /// blocking thread.
    async fn open(&self, key: &str) -> Result<ByteStream>;
}
