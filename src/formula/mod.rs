//! The formula model and its text representation.
//!
//! A [`Formula`] is one Homebrew formula for a Python application: project
//! metadata, an optional development head, a revision counter, shell completions,
//! the minimum interpreter version and the sorted resource list.
//!
//! The same model is produced from two places (see [`builder`]): a live project
//! resolution and an existing formula file. Rendering ([`render`]) and parsing
//! ([`parse`]) are inverse for any text this crate produced, which is what makes
//! [`Formula::update`] and [`diff`] meaningful.
//!
//! # Revisions
//!
//! `revision` only moves when the resource list changes content. Metadata edits
//! (description, homepage, head, completions, URLs) are applied silently.

pub mod builder;
pub mod diff;
pub mod parse;
pub mod render;
pub mod resource;

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::core::BrewerError;
use crate::utils::safe_write;

pub use builder::LoadedFormula;
pub use diff::{DiffLine, FormulaDiff};
pub use resource::{Resource, ResourceSource};

/// One `<shell>_completion.install "<path>"` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    /// Shell name (`bash`, `zsh`, `fish`)
    pub shell: String,
    /// Path of the completion script inside the source tree
    pub path: String,
}

impl Completion {
    pub fn new(shell: &str, path: &str) -> Self {
        Self {
            shell: shell.to_string(),
            path: path.to_string(),
        }
    }
}

/// Development head: repository URL, transport marker and optional branch.
///
/// Displays as the argument list of a `head` statement:
/// `"git@github.com:org/tool.git", :using => :git, branch: "main"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    /// Repository URL
    pub url: String,
    /// Whether the `:using => :git` marker is emitted
    pub using_git: bool,
    /// Branch to build from
    pub branch: Option<String>,
}

impl Head {
    /// Creates a head; SSH-style `git@` URLs get the git transport marker.
    pub fn new(url: &str, branch: Option<&str>) -> Self {
        Self {
            url: url.to_string(),
            using_git: url.starts_with("git@"),
            branch: branch.map(str::to_string),
        }
    }
}

impl fmt::Display for Head {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", render::ruby_escape(&self.url))?;
        if self.using_git {
            f.write_str(", :using => :git")?;
        }
        if let Some(branch) = &self.branch {
            write!(f, ", branch: \"{}\"", render::ruby_escape(branch))?;
        }
        Ok(())
    }
}

impl Serialize for Head {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of [`Formula::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Resources were identical; revision untouched.
    Unchanged,
    /// Resources were replaced and the revision bumped to `revision`.
    ContentChanged {
        /// New revision number
        revision: u32,
    },
}

/// A Homebrew formula for a Python application.
#[derive(Debug, Clone, Serialize)]
pub struct Formula {
    /// Ruby class name (`MyTool`)
    pub name: String,
    pub description: String,
    pub homepage: String,
    /// Development head, when the project configures one
    pub head: Option<Head>,
    /// Revision counter; `None` and `Some(0)` both mean "never bumped"
    pub revision: Option<u32>,
    pub completions: Vec<Completion>,
    /// Minimum interpreter version, rendered as `depends_on "python@X"`
    pub language_runtime_version: String,
    /// Sorted by name, unique by tarball URL
    pub resources: Vec<Resource>,
    pub repository_url: Option<String>,
    pub documentation_url: Option<String>,
}

/// Derives the formula class name from a project name.
///
/// The name is split on `-`, `_` and `.` and every part gets an upper-case first
/// letter: `my-tool` becomes `MyTool`, `django_admin.cli` becomes `DjangoAdminCli`.
pub fn class_name(project_name: &str) -> String {
    project_name
        .split(['-', '_', '.'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| first.to_uppercase().chain(chars).collect())
        })
        .collect()
}

impl Formula {
    /// Renders the formula text, without a trailing newline.
    pub fn render(&self) -> Result<String, BrewerError> {
        render::render(self)
    }

    /// Parses formula text; `file` is only used in error messages.
    pub fn parse(text: &str, file: &str) -> Result<Self, BrewerError> {
        parse::parse_formula(text, file)
    }

    /// Text persisted to disk: the render plus exactly one newline.
    pub fn file_contents(&self) -> Result<String, BrewerError> {
        let mut text = self.render()?;
        text.push('\n');
        Ok(text)
    }

    /// Writes the formula to `path` atomically.
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let contents = self.file_contents()?;
        safe_write(path, &contents)?;
        info!("Wrote formula {} to {}", self.name, path.display());
        Ok(())
    }

    /// Reconciles this formula with a freshly resolved one.
    ///
    /// Metadata (description, homepage, head, completions, repository and
    /// documentation URLs) is always taken from `other`. Resources are compared
    /// position by position on tarball URL; only when they differ are they
    /// replaced and the revision incremented (an unset revision becomes 1).
    /// `name` and `language_runtime_version` are kept.
    ///
    /// # Errors
    ///
    /// [`BrewerError::RevisionOverflow`] when the revision is already at its
    /// maximum; `self` is left untouched.
    pub fn update(&mut self, other: Formula) -> Result<UpdateOutcome, BrewerError> {
        let changed = !resource::same_resources(&self.resources, &other.resources);
        let revision = if changed {
            let current = self.revision.unwrap_or(0);
            Some(current.checked_add(1).ok_or(BrewerError::RevisionOverflow {
                revision: current,
            })?)
        } else {
            None
        };

        self.description = other.description;
        self.homepage = other.homepage;
        self.head = other.head;
        self.completions = other.completions;
        self.repository_url = other.repository_url;
        self.documentation_url = other.documentation_url;

        let Some(revision) = revision else {
            debug!("Resources of {} unchanged", self.name);
            return Ok(UpdateOutcome::Unchanged);
        };

        self.resources = other.resources;
        self.revision = Some(revision);
        debug!("Resources of {} changed, revision is now {}", self.name, revision);

        Ok(UpdateOutcome::ContentChanged {
            revision,
        })
    }
}
