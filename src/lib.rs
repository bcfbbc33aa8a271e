//! brewer - Homebrew formulas for Poetry projects
//!
//! Generates and maintains a Homebrew formula for a Python application from its
//! `pyproject.toml` and `poetry.lock`. Every locked runtime dependency becomes a
//! `resource` block with a download URL and checksum, so the formula installs the
//! application into a virtualenv with exactly the locked versions.
//!
//! # Architecture Overview
//!
//! The same [`formula::Formula`] model has three representations:
//! - a live project resolution ([`project::Project`] flattened by [`resolver`],
//!   with registry releases looked up through [`index`])
//! - the rendered Ruby text ([`formula::render`])
//! - the text read back from disk ([`formula::parse`])
//!
//! `brewer create` renders a fresh resolution. `brewer update` parses the existing
//! file, reconciles it with a fresh resolution and bumps the formula `revision`
//! only when the resource list actually changed.
//!
//! # Core Modules
//!
//! - [`cli`] - Command-line interface (`create`, `update`)
//! - [`config`] - `[tool.brewer]` settings and index settings
//! - [`core`] - Error types and user-facing error reporting
//! - [`formula`] - Formula model, rendering, parsing, diffing and builders
//! - [`index`] - Package index lookups (PyPI JSON API)
//! - [`project`] - `pyproject.toml` and `poetry.lock` loading
//! - [`resolver`] - Dependency graph flattening and resource resolution
//! - [`utils`] - Atomic file writes and progress bars
//!
//! # Example
//!
//! ```rust,no_run
//! use brewer::config::IndexSettings;
//! use brewer::formula::builder::from_project;
//! use brewer::index::PyPiIndex;
//! use brewer::project::Project;
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = IndexSettings::default();
//! let project = Project::load(Path::new("~/src/my-tool"))?;
//! let index = PyPiIndex::new(&settings.index_url, settings.timeout)?;
//! let formula = from_project(&project, &index, &settings).await?;
//! println!("{}", formula.render()?);
//! # Ok(())
//! # }
//! ```

// Core functionality modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;

// Formula model and text format
pub mod formula;

// Project resolution
pub mod index;
pub mod project;
pub mod resolver;

// Supporting modules
pub mod utils;
