//! The two ways a [`Formula`] comes into existence.
//!
//! - [`from_project`] resolves a live Poetry project: flatten the lock graph,
//!   look up registry releases, and fill metadata from `pyproject.toml`.
//! - [`LoadedFormula::load`] parses an existing formula file and remembers the
//!   text and modification time it was read with, for diffing and writing back.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::diff::FormulaDiff;
use super::{Formula, UpdateOutcome, class_name};
use crate::config::IndexSettings;
use crate::core::BrewerError;
use crate::index::PackageIndex;
use crate::project::Project;
use crate::resolver::{flatten, resolve_resources};
use crate::utils::ProgressBar;

/// Builds a formula from a resolved project.
///
/// Registry lookups run through `index` with `settings.max_parallel` requests in
/// flight. Any lookup failure aborts the build.
pub async fn from_project<I: PackageIndex>(
    project: &Project,
    index: &I,
    settings: &IndexSettings,
) -> Result<Formula, BrewerError> {
    let language_runtime_version = project.runtime_version()?;
    let packages = flatten(&project.dependencies, &project.lock, &project.config.excluded())?;
    info!("Resolving {} packages for {}", packages.len(), project.metadata.name);

    let progress = ProgressBar::new(packages.len() as u64, settings.show_progress);
    let resources = resolve_resources(&packages, index, settings.max_parallel, &progress).await?;

    Ok(Formula {
        name: class_name(&project.metadata.name),
        description: project.metadata.description.clone(),
        homepage: project.metadata.homepage.clone(),
        head: project.config.head(),
        revision: None,
        completions: project.config.completions(),
        language_runtime_version,
        resources,
        repository_url: project.metadata.repository.clone(),
        documentation_url: project.metadata.documentation.clone(),
    })
}

/// A formula read from disk, with the text it was parsed from.
#[derive(Debug, Clone)]
pub struct LoadedFormula {
    /// File the formula was read from and is written back to
    pub path: PathBuf,
    /// Exact file content at load time
    pub original: String,
    /// Modification time at load time
    pub modified: DateTime<Local>,
    /// The parsed model
    pub formula: Formula,
}

impl LoadedFormula {
    /// Reads and parses the formula at `path`.
    ///
    /// # Errors
    ///
    /// - [`BrewerError::FormulaNotFound`] when `path` does not exist
    /// - [`BrewerError::FormulaParseError`] / [`BrewerError::FormulaFieldMissing`]
    ///   when the text is not a formula this crate can read
    pub fn load(path: &Path) -> Result<Self, BrewerError> {
        if !path.is_file() {
            return Err(BrewerError::FormulaNotFound {
                path: path.display().to_string(),
            });
        }

        let original = std::fs::read_to_string(path)?;
        let modified = DateTime::<Local>::from(std::fs::metadata(path)?.modified()?);
        let formula = Formula::parse(&original, &path.display().to_string())?;
        debug!("Loaded formula {} from {}", formula.name, path.display());

        Ok(Self {
            path: path.to_path_buf(),
            original,
            modified,
            formula,
        })
    }

    /// Applies [`Formula::update`] to the loaded formula.
    pub fn update(&mut self, fresh: Formula) -> Result<UpdateOutcome, BrewerError> {
        self.formula.update(fresh)
    }

    /// Diff from the loaded text to the current render, stamped with the current time.
    pub fn diff(&self) -> Result<FormulaDiff, BrewerError> {
        self.diff_at(Local::now())
    }

    /// Same as [`diff`](Self::diff) with an explicit timestamp for the new side.
    pub fn diff_at(&self, now: DateTime<Local>) -> Result<FormulaDiff, BrewerError> {
        let rendered = self.formula.render()?;
        Ok(FormulaDiff::compute(
            &self.path.display().to_string(),
            &self.original,
            &rendered,
            self.modified,
            now,
        ))
    }

    /// Writes the current formula back to the file it was loaded from.
    pub fn write(&self) -> anyhow::Result<()> {
        self.formula.write(&self.path)
    }
}
