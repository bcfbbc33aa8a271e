//! Update an existing formula from its Poetry project.
//!
//! The formula file is parsed, the project resolved afresh, and the two reconciled:
//! metadata is refreshed, and resources are replaced with a `revision` bump only
//! when they changed. With `--diff` the result is shown instead of written.
//!
//! ```bash
//! brewer update ~/src/my-tool Formula/my-tool.rb
//! brewer update ~/src/my-tool Formula/my-tool.rb --diff
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::CliConfig;
use crate::formula::builder::from_project;
use crate::formula::{LoadedFormula, UpdateOutcome};
use crate::index::PyPiIndex;
use crate::project::Project;
use crate::utils::expand_home;

/// Command to reconcile a formula file with its project.
#[derive(Args, Debug)]
pub struct UpdateCommand {
    /// Project directory, or its pyproject.toml
    project: PathBuf,

    /// Existing formula file
    formula: PathBuf,

    /// Show a unified diff instead of writing the file
    #[arg(long)]
    diff: bool,
}

impl UpdateCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        // Parse the file first so a broken formula fails before any lookups
        let mut loaded = LoadedFormula::load(&expand_home(&self.formula))?;
        let project = Project::load(&self.project)?;
        let index = PyPiIndex::new(&config.settings.index_url, config.settings.timeout)?;
        let fresh = from_project(&project, &index, &config.settings).await?;

        let outcome = loaded.update(fresh)?;

        if self.diff {
            println!("{}", loaded.diff()?);
            return Ok(());
        }

        loaded.write()?;
        if !config.quiet {
            match outcome {
                UpdateOutcome::Unchanged => println!(
                    "{} {} resources unchanged",
                    "✓".green(),
                    loaded.path.display()
                ),
                UpdateOutcome::ContentChanged {
                    revision,
                } => println!(
                    "{} Updated {} to revision {}",
                    "✓".green(),
                    loaded.path.display(),
                    revision
                ),
            }
        }

        Ok(())
    }
}
