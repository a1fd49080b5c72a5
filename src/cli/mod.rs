//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Commands
//!
//! - `sync` - Replay changed files and emit messages on stdout
//! - `check` - List the files each table would read, without reading them
//! - `validate` - Validate the configuration file

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
