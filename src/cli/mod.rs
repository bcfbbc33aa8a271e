//! Command-line interface for brewer.
//!
//! # Commands
//!
//! - `create <project> [formula]` - Render a formula for a Poetry project, printing
//!   it or writing it to `formula`
//! - `update <project> <formula> [--diff]` - Reconcile an existing formula with the
//!   project, writing it back or showing the difference
//!
//! # Global Options
//!
//! - `-v, --verbose` - Debug logging
//! - `-q, --quiet` - Errors only, no status lines or progress
//! - `--no-progress` - Hide the lookup progress bar (`BREWER_NO_PROGRESS`)
//! - `--index-url <URL>` - PyPI-compatible JSON API (`BREWER_INDEX_URL`)
//! - `--timeout <SECONDS>` - Per-request timeout (`BREWER_TIMEOUT`)
//! - `--max-parallel <N>` - Concurrent index lookups (`BREWER_MAX_PARALLEL`)
//!
//! Logs go to stderr. Without `--verbose` or `--quiet` the level comes from
//! `RUST_LOG`, defaulting to warnings.

mod create;
mod update;


use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::config::IndexSettings;
use crate::constants::{DEFAULT_INDEX_URL, DEFAULT_REQUEST_TIMEOUT, default_parallelism};

pub use create::CreateCommand;
pub use update::UpdateCommand;

/// Settings derived from global flags, shared by every command.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Explicit log filter; `None` defers to `RUST_LOG`
    pub log_level: Option<String>,
    /// Suppress status output
    pub quiet: bool,
    /// Registry lookup settings
    pub settings: IndexSettings,
}

/// Package index options.
#[derive(Args, Debug, Clone)]
pub struct IndexArgs {
    /// Base URL of a PyPI-compatible JSON API
    #[arg(long, global = true, env = "BREWER_INDEX_URL", default_value = DEFAULT_INDEX_URL)]
    index_url: String,

    /// Timeout for each index request, in seconds
    #[arg(long, global = true, env = "BREWER_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    timeout: u64,

    /// Maximum number of concurrent index lookups (default: twice the CPU count, 4 to 16)
    #[arg(long, global = true, env = "BREWER_MAX_PARALLEL")]
    max_parallel: Option<usize>,
}

/// Main CLI structure for brewer.
#[derive(Parser)]
#[command(
    name = "brewer",
    about = "Generate and maintain Homebrew formulas for Poetry projects",
    version,
    long_about = "brewer renders a Homebrew formula with one resource per locked dependency of a Poetry project, and keeps existing formulas in sync with the lockfile."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable the progress bar
    #[arg(long, global = true, env = "BREWER_NO_PROGRESS")]
    no_progress: bool,

    #[command(flatten)]
    index: IndexArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a formula from a Poetry project
    Create(CreateCommand),

    /// Update an existing formula from a Poetry project
    Update(UpdateCommand),
}

impl Cli {
    /// Initializes logging and runs the selected command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        init_logging(config.log_level.as_deref());
        self.execute_with_config(config).await
    }

    /// Derives the shared configuration from global flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            quiet: self.quiet,
            settings: IndexSettings {
                index_url: self.index.index_url.clone(),
                timeout: Duration::from_secs(self.index.timeout),
                max_parallel: self.index.max_parallel.unwrap_or_else(default_parallelism).max(1),
                show_progress: !(self.no_progress || self.quiet),
            },
        }
    }

    /// Runs the selected command with an explicit configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Create(cmd) => cmd.execute(&config).await,
            Commands::Update(cmd) => cmd.execute(&config).await,
        }
    }
}

/// Installs the global tracing subscriber, writing to stderr.
fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
