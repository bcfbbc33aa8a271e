//! brewer CLI entry point
//!
//! Parses arguments, runs the selected command and turns any failure into a
//! user-friendly report on stderr with exit status 1.
//!
//! - `create` - Render a formula for a Poetry project
//! - `update` - Reconcile an existing formula with the project's lockfile

use anyhow::Result;
use brewer::cli;
use brewer::core::user_friendly_error;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
