//! In-memory file store
//!
//! Holds files with explicit modification times, which object stores do not
//! let callers choose. Useful for embedding and for replay tests.

use super::types::{ByteStream, FileDescriptor, FileStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::{Buf, Bytes};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct StoredFile {
    last_modified: DateTime<Utc>,
    contents: Bytes,
}

/// File store kept entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryFileStore {
    files: BTreeMap<String, StoredFile>,
}

impl MemoryFileStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        last_modified: DateTime<Utc>,
        contents: impl Into<Bytes>,
    ) {
        self.files.insert(
            key.into(),
            StoredFile {
                last_modified,
                contents: contents.into(),
            },
        );
    }

    /// Builder-style [`insert`](Self::insert)
    #[must_use]
    pub fn with_file(
        mut self,
        key: impl Into<String>,
        last_modified: DateTime<Utc>,
        contents: impl Into<Bytes>,
    ) -> Self {
        self.insert(key, last_modified, contents);
        self
    }

    /// Number of stored files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn list(&self, prefix: Option<&str>) -> Result<Vec<FileDescriptor>> {
        let prefix = prefix.unwrap_or("");
        Ok(self
            .files
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, file)| {
                FileDescriptor::new(key.clone(), file.last_modified, file.contents.len() as u64)
            })
            .collect())
    }

    async fn open(&self, key: &str) -> Result<ByteStream> {
        let file = self
            .files
            .get(key)
            .ok_or_else(|| Error::storage(format!("Object not found: {key}")))?;
        Ok(Box::new(file.contents.clone().reader()))
    }
}
