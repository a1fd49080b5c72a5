//! State management module
//!
//! Handles watermark tracking and checkpointing.
//! State is persisted between sync runs to enable incremental syncs.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Bookmarks keyed by table name
//! - `StateManager` - File-based or in-memory state persistence
//! - Checkpointing after every completed file

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{Bookmark, State, MODIFIED_SINCE};
