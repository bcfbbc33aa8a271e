//! Configuration for formula generation.
//!
//! Two layers feed a run:
//!
//! 1. **Project configuration**: the `[tool.brewer]` table of `pyproject.toml`,
//!    committed with the project and describing what goes into its formula.
//! 2. **Index settings**: where and how registry releases are looked up. These come
//!    from command-line flags with `BREWER_*` environment fallbacks.
//!
//! ```toml
//! [tool.brewer.git]
//! head = "https://github.com/org/tool.git"
//! branch = "main"
//!
//! [tool.brewer.completions]
//! zsh = "completions/_tool"
//! bash = "completions/tool.bash"
//!
//! [tool.brewer.dependencies]
//! exclude = ["pytest", "black"]
//! ```

use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::constants::{DEFAULT_INDEX_URL, DEFAULT_REQUEST_TIMEOUT, default_parallelism};
use crate::core::BrewerError;
use crate::formula::{Completion, Head};
use crate::project::lock::canonicalize_name;

/// The `[tool.brewer]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BrewerConfig {
    /// Development head settings
    pub git: Option<GitConfig>,
    /// Shell name to completion script path
    pub completions: BTreeMap<String, String>,
    /// Dependency filtering
    pub dependencies: DependencyConfig,
}

/// The `[tool.brewer.git]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Repository URL installed by `brew install --HEAD`
    pub head: Option<String>,
    /// Branch to follow; omitted from the formula when unset
    pub branch: Option<String>,
}

/// The `[tool.brewer.dependencies]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DependencyConfig {
    /// Packages to leave out of the formula; their own dependencies are kept
    pub exclude: Vec<String>,
}

impl BrewerConfig {
    /// Checks values that end up in the formula as Ruby identifiers.
    ///
    /// # Errors
    ///
    /// [`BrewerError::ProjectParseError`] naming `file` when a completion shell
    /// is not a single word.
    pub fn validate(&self, file: &str) -> Result<(), BrewerError> {
        let parse_error = |reason: String| BrewerError::ProjectParseError {
            file: file.to_string(),
            reason,
        };

        // The shell becomes the `<shell>_completion` method in the formula.
        let shell_name = Regex::new(r"^\w+$").map_err(|e| parse_error(e.to_string()))?;
        match self.completions.keys().find(|shell| !shell_name.is_match(shell)) {
            Some(shell) => Err(parse_error(format!("invalid completion shell '{shell}'"))),
            None => Ok(()),
        }
    }

    /// Formula `head` line, present only when `git.head` is configured.
    pub fn head(&self) -> Option<Head> {
        let git = self.git.as_ref()?;
        let url = git.head.as_deref()?;
        Some(Head::new(url, git.branch.as_deref()))
    }

    /// Completion install lines, ordered by shell name.
    pub fn completions(&self) -> Vec<Completion> {
        self.completions.iter().map(|(shell, path)| Completion::new(shell, path)).collect()
    }

    /// Canonical names of excluded packages.
    pub fn excluded(&self) -> BTreeSet<String> {
        self.dependencies.exclude.iter().map(|name| canonicalize_name(name)).collect()
    }
}

/// How registry lookups are performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSettings {
    /// Base URL of a PyPI-compatible JSON API
    pub index_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum number of lookups in flight
    pub max_parallel: usize,
    /// Whether to draw a progress bar while looking up releases
    pub show_progress: bool,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            max_parallel: default_parallelism(),
            show_progress: true,
        }
    }
}
