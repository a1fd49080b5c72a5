//! Engine types
//!
//! Run settings and statistics for the sync engine.

use crate::config::TapConfig;
use crate::decode::DecodeOptions;
use crate::error::Result;
use chrono::{DateTime, Utc};

/// Settings shared by every table in a run
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Bucket name written into `_sdc_source_bucket`
    pub bucket: String,
    /// Watermark for tables without a bookmark
    pub start_date: Option<DateTime<Utc>>,
    /// Decoder name; `None` selects the default
    pub encoding_module: Option<String>,
    /// Options passed to the decoder for every file
    pub decode_options: DecodeOptions,
}

impl SyncConfig {
    /// Create settings for a bucket
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    /// Settings from a loaded tap configuration
    pub fn from_tap_config(config: &TapConfig) -> Result<Self> {
        Ok(Self {
            bucket: config.bucket.clone(),
            start_date: config.start_date()?,
            encoding_module: config.encoding_module(),
            decode_options: DecodeOptions::unbounded(),
        })
    }

    /// Set the default watermark
    #[must_use]
    pub fn with_start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    /// Select a decoder by name
    #[must_use]
    pub fn with_encoding_module(mut self, name: impl Into<String>) -> Self {
        self.encoding_module = Some(name.into());
        self
    }

    /// Set decoder options
    #[must_use]
    pub fn with_decode_options(mut self, options: DecodeOptions) -> Self {
        self.decode_options = options;
        self
    }
}

/// Records emitted for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    /// Table name
    pub table: String,
    /// Records emitted
    pub records: u64,
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Total records emitted
    pub records_synced: u64,
    /// Files fully emitted and committed
    pub files_synced: usize,
    /// Tables completed
    pub tables_synced: usize,
    /// Recovered problems, such as an unknown decoder name
    pub warnings: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records
    pub fn add_records(&mut self, count: u64) {
        self.records_synced += count;
    }

    /// Add a committed file
    pub fn add_file(&mut self) {
        self.files_synced += 1;
    }

    /// Add a completed table
    pub fn add_table(&mut self) {
        self.tables_synced += 1;
    }

    /// Add a warning
    pub fn add_warning(&mut self) {
        self.warnings += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
