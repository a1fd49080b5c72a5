//! State manager implementation
//!
//! Provides file-based state persistence with atomic writes. The orchestrator
//! is the only writer, so the state is owned directly rather than shared.

use super::types::State;
use crate::error::{Error, Result};
use crate::timestamp::{format_bookmark, parse_datetime};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// State manager for persisting and loading bookmarks
#[derive(Debug, Clone)]
pub struct StateManager {
    /// Path to the state file (empty for in-memory mode)
    path: PathBuf,
    /// Current state
    state: State,
    /// Number of successful saves
    saves: usize,
}

impl StateManager {
    /// Create a new state manager with the given path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_state(path.as_ref().to_path_buf(), State::new())
    }

    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self::with_state(PathBuf::new(), State::new())
    }

    fn with_state(path: PathBuf, state: State) -> Self {
        Self {
            path,
            state,
            saves: 0,
        }
    }

    /// Create a state manager from a file, loading existing state if present
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| Error::State {
                message: format!("Failed to read state file: {e}"),
            })?;
            parse_state(&contents)?
        } else {
            State::new()
        };

        Ok(Self::with_state(path, state))
    }

    /// Create an in-memory state manager from inline JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::with_state(PathBuf::new(), parse_state(json)?))
    }

    /// Save current state to file
    pub async fn save(&mut self) -> Result<()> {
        if self.is_in_memory() {
            self.saves += 1;
            return Ok(());
        }

        let contents = serde_json::to_string_pretty(&self.state).map_err(|e| Error::State {
            message: format!("Failed to serialize state: {e}"),
        })?;

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::State {
                message: format!("Failed to write state file: {e}"),
            })?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::State {
                message: format!("Failed to rename state file: {e}"),
            })?;

        self.saves += 1;
        Ok(())
    }

    /// Current state
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Export state as JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.state).map_err(|e| Error::State {
            message: format!("Failed to serialize state: {e}"),
        })
    }

    /// A table's watermark, if one has been committed
    pub fn modified_since(&self, table: &str) -> Result<Option<DateTime<Utc>>> {
        match self.state.modified_since(table) {
            None => Ok(None),
            Some(raw) => parse_datetime(raw).map(Some).ok_or_else(|| {
                Error::state(format!(
                    "Bookmark modified_since for '{table}' is not a timestamp: {raw}"
                ))
            }),
        }
    }

    /// Advance a table's watermark in memory; call [`save`](Self::save) to persist
    ///
    /// The stored value never moves backwards.
    pub fn advance_modified_since(&mut self, table: &str, value: &DateTime<Utc>) -> Result<()> {
        if let Some(current) = self.modified_since(table)? {
            if current > *value {
                return Ok(());
            }
        }
        self.state
            .set_modified_since(table, format_bookmark(value));
        Ok(())
    }

    /// Clear state for a specific table
    pub fn clear_table(&mut self, table: &str) {
        self.state.bookmarks.remove(table);
    }

    /// Number of successful saves since creation
    pub fn save_count(&self) -> usize {
        self.saves
    }

    /// Get the state file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

fn parse_state(contents: &str) -> Result<State> {
    if contents.trim().is_empty() {
        return Ok(State::new());
    }
    serde_json::from_str(contents).map_err(|e| Error::State {
        message: format!("Failed to parse state: {e}"),
    })
}
