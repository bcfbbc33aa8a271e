//! Create a formula for a Poetry project.
//!
//! ```bash
//! # Print the formula
//! brewer create ~/src/my-tool
//!
//! # Write it into a tap
//! brewer create ~/src/my-tool Formula/my-tool.rb
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::CliConfig;
use crate::formula::builder::from_project;
use crate::index::PyPiIndex;
use crate::project::Project;
use crate::utils::expand_home;

/// Command to render a formula from a project.
#[derive(Args, Debug)]
pub struct CreateCommand {
    /// Project directory, or its pyproject.toml
    project: PathBuf,

    /// Formula file to write (prints to stdout when omitted)
    formula: Option<PathBuf>,
}

impl CreateCommand {
    /// Resolves the project and prints or writes the formula.
    ///
    /// Nothing is written unless every package resolved.
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let project = Project::load(&self.project)?;
        let index = PyPiIndex::new(&config.settings.index_url, config.settings.timeout)?;
        let formula = from_project(&project, &index, &config.settings).await?;

        match self.formula {
            Some(path) => {
                let path = expand_home(&path);
                formula.write(&path)?;
                if !config.quiet {
                    println!(
                        "{} Created {} with {} resources",
                        "✓".green(),
                        path.display(),
                        formula.resources.len()
                    );
                }
            }
            None => println!("{}", formula.render()?),
        }

        Ok(())
    }
}
