//! Command-line interface for dagweld.

pub mod args;
mod commands;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, ConfigError};
use crate::export::ExportError;
use crate::extract::ExtractError;
use crate::merge::MergeError;
use crate::store::{DagStore, HttpDagStore, StoreError};

pub use args::{CidInput, OutputArgs};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during CLI execution.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument processing error.
    #[error("{0}")]
    Args(#[from] args::ArgsError),

    /// Configuration error.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Merge error.
    #[error("{0}")]
    Merge(#[from] MergeError),

    /// Extraction error.
    #[error("{0}")]
    Extract(#[from] ExtractError),

    /// Export error.
    #[error("{0}")]
    Export(#[from] ExportError),

    /// Store error.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

// =============================================================================
// CLI Definition
// =============================================================================

/// dagweld - directory DAG merge and extraction for content-addressed stores.
#[derive(Parser, Debug)]
#[command(name = "dagweld", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge the children of several roots into one new directory.
    #[command(name = "merge-roots")]
    MergeRoots(commands::merge_roots::MergeRootsCommand),

    /// Synthesize per-item directories from files manifests.
    #[command(name = "extract-items")]
    ExtractItems(commands::extract_items::ExtractItemsCommand),

    /// Build a parent directory over existing roots without traversal.
    Collect(commands::collect::CollectCommand),
}

// =============================================================================
// CLI Execution
// =============================================================================

impl Cli {
    /// Parse command-line arguments and return the CLI instance.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Run the CLI command against the given store.
    pub async fn run(self, store: &dyn DagStore, config: &Config) -> Result<()> {
        match self.command {
            Command::MergeRoots(command) => command.run(store, config).await,
            Command::ExtractItems(command) => command.run(store, config).await,
            Command::Collect(command) => command.run(store, config).await,
        }
    }
}

/// Main entry point for the CLI.
///
/// Diagnostics go to stderr so stdout stays parseable (the commands print
/// CIDs and CSV rows there).
pub async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();
    let config = Config::from_env()?;
    let store = HttpDagStore::new(&config.api_url);
    cli.run(&store, &config).await
}
