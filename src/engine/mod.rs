//! Execution engine module
//!
//! Main read loop and table orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Replays changed files per table and commits bookmarks
//! - `SyncConfig` - Run-level settings (bucket, start date, decoder)
//! - `SyncStats` - Counters for a run
//!
//! Files are processed one at a time in `(last_modified, key)` order. A
//! file is decoded on a blocking thread while its records are written here.
//! A table's bookmark advances only after all of a file's records have been
//! written, so a failed run resumes at the first unfinished file.

mod types;

pub use types::{SyncConfig, SyncStats, TableSummary};

use crate::config::{TableSpec, TapConfig};
use crate::decode::{spawn_rows, DecoderRegistry, RowDecoder};
use crate::error::{Error, Result};
use crate::output::{enrich, Message, MessageSink, SequencedRecord};
use crate::schema::{MetadataMap, SchemaProperty, Transformer};
use crate::state::StateManager;
use crate::storage::{sort_for_replay, FileDescriptor, FileSelector, FileStore};
use crate::timestamp::format_bookmark;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Sync engine for replaying table files
pub struct SyncEngine {
    /// Where table files live
    store: Arc<dyn FileStore>,
    /// Bookmarks
    state: StateManager,
    /// Available row decoders
    decoders: DecoderRegistry,
    /// Run settings
    config: SyncConfig,
    /// Statistics
    stats: SyncStats,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(store: Arc<dyn FileStore>, state: StateManager, config: SyncConfig) -> Self {
        Self {
            store,
            state,
            decoders: DecoderRegistry::new(),
            config,
            stats: SyncStats::default(),
        }
    }

    /// Create an engine from a loaded tap configuration
    pub fn from_tap_config(
        store: Arc<dyn FileStore>,
        state: StateManager,
        config: &TapConfig,
    ) -> Result<Self> {
        Ok(Self::new(store, state, SyncConfig::from_tap_config(config)?))
    }

    /// Replace the decoder registry
    #[must_use]
    pub fn with_decoders(mut self, decoders: DecoderRegistry) -> Self {
        self.decoders = decoders;
        self
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Take back the state manager
    pub fn into_state(self) -> StateManager {
        self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Reset statistics
    pub fn reset_stats(&mut self) {
        self.stats = SyncStats::default();
    }

    /// Sync several tables in order
    ///
    /// Every table's definition and starting watermark is checked before the
    /// first one is listed. The first failing table stops the run.
    pub async fn sync_all(
        &mut self,
        tables: &[TableSpec],
        sink: &mut dyn MessageSink,
    ) -> Result<Vec<TableSummary>> {
        for table in tables {
            table.validate()?;
            self.starting_watermark(table)?;
        }

        let start = Instant::now();
        let mut summaries = Vec::with_capacity(tables.len());
        for table in tables {
            let records = self.sync_table(table, sink).await?;
            summaries.push(TableSummary {
                table: table.table_name.clone(),
                records,
            });
        }
        sink.flush()?;

        self.stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            tables = self.stats.tables_synced,
            files = self.stats.files_synced,
            records = self.stats.records_synced,
            warnings = self.stats.warnings,
            duration_ms = self.stats.duration_ms,
            "Sync completed"
        );
        Ok(summaries)
    }

    /// Sync one table, returning the number of records emitted
    pub async fn sync_table(
        &mut self,
        table: &TableSpec,
        sink: &mut dyn MessageSink,
    ) -> Result<u64> {
        table.validate()?;
        let since = self.starting_watermark(table)?;
        let schema = table.effective_schema();
        let metadata = table.metadata_map();

        sink.emit(&Message::schema(
            &table.table_name,
            schema.clone(),
            table.key_properties.clone(),
        ))?;

        info!(
            table = %table.table_name,
            modified_since = %format_bookmark(&since),
            "Syncing table"
        );

        let mut files = FileSelector::new(self.store.as_ref())
            .list_files(table, &since)
            .await?;
        sort_for_replay(&mut files);

        let resolved = self.decoders.resolve(self.config.encoding_module.as_deref());
        if resolved.fell_back {
            self.stats.add_warning();
        }
        let decoder = resolved.decoder;

        let mut records = 0u64;
        for file in &files {
            records += self
                .sync_file(table, file, &decoder, &schema, &metadata, sink)
                .await?;
            self.commit(table, file, sink).await?;
        }

        self.stats.add_table();
        info!(
            table = %table.table_name,
            files = files.len(),
            records,
            "Wrote {records} records for table"
        );
        Ok(records)
    }

    /// Watermark a table starts from: its bookmark, else the start date
    ///
    /// Fails with a configuration error when neither exists, and with a
    /// state error when the stored bookmark cannot be parsed.
    pub fn starting_watermark(&self, table: &TableSpec) -> Result<DateTime<Utc>> {
        if let Some(bookmark) = self.state.modified_since(&table.table_name)? {
            return Ok(bookmark);
        }
        self.config.start_date.ok_or_else(|| {
            Error::config(format!(
                "table '{}' has no bookmark and no start_date is configured",
                table.table_name
            ))
        })
    }

    /// Emit every record of one file
    async fn sync_file(
        &mut self,
        table: &TableSpec,
        file: &FileDescriptor,
        decoder: &Arc<dyn RowDecoder>,
        schema: &SchemaProperty,
        metadata: &MetadataMap,
        sink: &mut dyn MessageSink,
    ) -> Result<u64> {
        info!(table = %table.table_name, key = %file.key, "Syncing file");

        let stream = self.store.open(&file.key).await?;
        let mut rows = spawn_rows(
            Arc::clone(decoder),
            stream,
            table.clone(),
            file.key.clone(),
            self.config.decode_options.clone(),
        );
        let mut transformer = Transformer::new(schema, metadata);
        let sequence = file.sequence();

        let mut count = 0u64;
        let mut row_index = 0usize;
        while let Some(row) = rows.next().await {
            let row = enrich(row?, &self.config.bucket, &file.key, row_index);
            let record = transformer.transform(row).inspect_err(|e| {
                error!(
                    key = %file.key,
                    line = row_index + 2,
                    error = %e,
                    "Record does not fit the table schema"
                );
            })?;
            sink.emit(&Message::record(
                &table.table_name,
                SequencedRecord::new(record, sequence),
            ))?;
            count += 1;
            row_index += 1;
            self.stats.add_records(1);
        }
        transformer.log_warnings();

        debug!(key = %file.key, records = count, sequence, "Finished file");
        Ok(count)
    }

    /// Advance and persist the bookmark after a file, then announce it
    async fn commit(
        &mut self,
        table: &TableSpec,
        file: &FileDescriptor,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        self.state
            .advance_modified_since(&table.table_name, &file.last_modified)?;
        self.state.save().await?;
        sink.emit(&Message::state(self.state.state().clone()))?;
        self.stats.add_file();
        Ok(())
    }
}
