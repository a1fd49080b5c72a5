//! CLI runner - executes commands

use crate::cli::commands::{parse_table_list, Cli, Commands};
use crate::config::TapConfig;
use crate::engine::SyncEngine;
use crate::error::{Error, Result, ResultExt};
use crate::output::JsonLinesWriter;
use crate::state::StateManager;
use crate::storage::{FileSelector, FileStore, ObjectStoreFiles};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Sync { tables } => self.sync(tables.as_deref()).await,
            Commands::Check { tables } => self.check(tables.as_deref()).await,
            Commands::Validate => self.validate(),
        }
    }

    /// Load and validate the configuration file
    fn load_config(&self) -> Result<TapConfig> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Config file not specified (use -C flag)"))?;
        let config = TapConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load state from inline JSON, a file, or start empty
    fn load_state(&self) -> Result<StateManager> {
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    fn open_store(config: &TapConfig) -> Result<Arc<dyn FileStore>> {
        let url = config.storage_url();
        let store = ObjectStoreFiles::parse(&url).context(format!("Failed to open {url}"))?;
        info!(url = %url, scheme = store.scheme(), "Opened object store");
        Ok(Arc::new(store))
    }

    /// Sync tables to stdout
    async fn sync(&self, tables: Option<&str>) -> Result<()> {
        let config = self.load_config()?;
        let tables = config.selected_tables(&parse_table_list(tables))?;
        let state = self.load_state()?;
        let store = Self::open_store(&config)?;

        let mut engine = SyncEngine::from_tap_config(store, state, &config)?;
        let mut sink = JsonLinesWriter::stdout().with_pretty(self.cli.pretty());
        engine.sync_all(&tables, &mut sink).await?;
        Ok(())
    }

    /// Report the files each table would read
    async fn check(&self, tables: Option<&str>) -> Result<()> {
        let config = self.load_config()?;
        let tables = config.selected_tables(&parse_table_list(tables))?;
        let state = self.load_state()?;
        let store = Self::open_store(&config)?;
        let engine = SyncEngine::from_tap_config(Arc::clone(&store), state, &config)?;
        let selector = FileSelector::new(store.as_ref());

        let mut report = Vec::with_capacity(tables.len());
        for table in &tables {
            let since = engine.starting_watermark(table)?;
            let files = selector.list_files(table, &since).await?;
            report.push(json!({
                "table": table.table_name,
                "modified_since": crate::timestamp::format_bookmark(&since),
                "files": files.len(),
                "bytes": files.iter().map(|f| f.size).sum::<u64>(),
            }));
        }

        self.output(&json!({ "status": "SUCCEEDED", "tables": report }))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;
        self.output(&json!({
            "status": "VALID",
            "bucket": config.bucket,
            "storage_url": config.storage_url(),
            "tables": config.tables.iter().map(|t| t.table_name.as_str()).collect::<Vec<_>>(),
        }))
    }

    fn output(&self, value: &serde_json::Value) -> Result<()> {
        let rendered = if self.cli.pretty() {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
        .map_err(|e| Error::output(format!("Failed to serialize report: {e}")))?;
        println!("{rendered}");
        Ok(())
    }
}
