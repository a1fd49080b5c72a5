//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Incremental object storage CSV tap
#[derive(Parser, Debug)]
#[command(name = "object-csv-tap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON or YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// State file (JSON); rewritten after every committed file
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON (not persisted)
    #[arg(long, global = true)]
    pub state_json: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync tables and write messages to stdout
    Sync {
        /// Tables to sync (comma-separated, empty = all)
        #[arg(long)]
        tables: Option<String>,
    },

    /// List the files each table would read from its watermark
    Check {
        /// Tables to check (comma-separated, empty = all)
        #[arg(long)]
        tables: Option<String>,
    },

    /// Validate the configuration file
    Validate,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

impl Cli {
    /// Whether output should be pretty-printed
    pub fn pretty(&self) -> bool {
        self.format == OutputFormat::Pretty
    }
}

/// Split a comma-separated table list
pub(crate) fn parse_table_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
