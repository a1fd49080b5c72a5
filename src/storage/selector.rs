//! File selection
//!
//! Finds the files of a table that changed after its watermark.

use super::types::{FileDescriptor, FileStore};
use crate::config::TableSpec;
use crate::error::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Selects a table's candidate files from a store
pub struct FileSelector<'a> {
    store: &'a dyn FileStore,
}

impl<'a> FileSelector<'a> {
    /// Create a selector over a store
    pub fn new(store: &'a dyn FileStore) -> Self {
        Self { store }
    }

    /// Every file matching the table's pattern modified strictly after `since`
    ///
    /// Storage faults are returned unchanged. The result is in listing order;
    /// use [`sort_for_replay`] before processing.
    pub async fn list_files(
        &self,
        table: &TableSpec,
        since: &DateTime<Utc>,
    ) -> Result<Vec<FileDescriptor>> {
        let pattern = table.pattern()?;
        let prefix = table.search_prefix.as_deref();

        info!(
            table = %table.table_name,
            prefix = prefix.unwrap_or(""),
            pattern = %table.search_pattern,
            "Checking bucket for files matching pattern"
        );

        let listed = self.store.list(prefix).await?;
        let listed_count = listed.len();

        let mut matched = 0usize;
        let selected: Vec<FileDescriptor> = listed
            .into_iter()
            .filter(|file| pattern.is_match(&file.key))
            .inspect(|_| matched += 1)
            .filter(|file| {
                let newer = file.last_modified > *since;
                if !newer {
                    debug!(key = %file.key, "Skipping file not modified since watermark");
                }
                newer
            })
            .collect();

        info!(
            table = %table.table_name,
            listed = listed_count,
            matched,
            selected = selected.len(),
            "Found files modified since {since}"
        );

        Ok(selected)
    }
}

/// Sort files for deterministic replay: modification time ascending, ties by key
///
/// The whole file set is held in memory; tables with more files than fit in
/// memory cannot be synced in one run.
pub fn sort_for_replay(files: &mut [FileDescriptor]) {
    files.sort_by(FileDescriptor::replay_cmp);
}
