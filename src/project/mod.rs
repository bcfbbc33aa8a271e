//! Poetry project loading.
//!
//! A [`Project`] is the live resolution a formula is built from: metadata and direct
//! dependencies from `pyproject.toml`, plus the resolved [`LockGraph`] from
//! `poetry.lock`. Metadata is taken from `[tool.poetry]` first and falls back to the
//! PEP 621 `[project]` table field by field.

pub mod lock;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::BrewerConfig;
use crate::constants::{LOCK_FILE, PROJECT_FILE};
use crate::core::BrewerError;
use crate::utils::expand_home;

pub use lock::{DependencySpec, LockGraph, LockedPackage, PackageId, PackageSource, canonicalize_name};

/// Name of the interpreter requirement inside Poetry dependency tables.
const RUNTIME_DEPENDENCY: &str = "python";

/// Descriptive metadata copied into the formula.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectMetadata {
    /// Distribution name
    pub name: String,
    /// One-line summary
    pub description: String,
    /// Project home page
    pub homepage: String,
    /// Source repository URL
    pub repository: Option<String>,
    /// Documentation URL
    pub documentation: Option<String>,
}

/// A Poetry project with its resolved lock graph.
#[derive(Debug, Clone)]
pub struct Project {
    /// Directory holding `pyproject.toml`
    pub root: PathBuf,
    /// Metadata from `pyproject.toml`
    pub metadata: ProjectMetadata,
    /// Interpreter requirement, such as `^3.9` or `>=3.9,<4`
    pub runtime_requirement: Option<String>,
    /// Direct runtime dependencies (main group only)
    pub dependencies: Vec<DependencySpec>,
    /// `[tool.brewer]` settings
    pub config: BrewerConfig,
    /// Resolved packages
    pub lock: LockGraph,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PyProject {
    tool: ToolTables,
    project: Option<Pep621Project>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ToolTables {
    poetry: Option<PoetryProject>,
    brewer: Option<BrewerConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PoetryProject {
    name: Option<String>,
    description: Option<String>,
    homepage: Option<String>,
    repository: Option<String>,
    documentation: Option<String>,
    dependencies: BTreeMap<String, PoetryDependency>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PoetryDependency {
    Constraint(String),
    Detailed(PoetryDetailedDependency),
    Multiple(Vec<PoetryDetailedDependency>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PoetryDetailedDependency {
    version: Option<String>,
    optional: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Pep621Project {
    name: Option<String>,
    description: Option<String>,
    #[serde(rename = "requires-python")]
    requires_python: Option<String>,
    dependencies: Vec<String>,
    urls: BTreeMap<String, String>,
}

impl PoetryDependency {
    fn constraint(&self) -> Option<String> {
        match self {
            Self::Constraint(constraint) => Some(constraint.clone()),
            Self::Detailed(d) => d.version.clone(),
            Self::Multiple(entries) => entries.first().and_then(|d| d.version.clone()),
        }
    }

    fn optional(&self) -> bool {
        match self {
            Self::Constraint(_) => false,
            Self::Detailed(d) => d.optional,
            Self::Multiple(entries) => entries.iter().all(|d| d.optional),
        }
    }
}

impl Pep621Project {
    /// Looks up a `[project.urls]` entry case-insensitively.
    fn url(&self, key: &str) -> Option<String> {
        self.urls.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v.clone())
    }
}

/// Reads the package name from a PEP 508 requirement string.
///
/// `requests[socks]>=2.31 ; python_version < "3.12"` yields `requests`. Extras,
/// version specifiers and markers are not needed to find the locked package.
fn parse_requirement(requirement: &str) -> Option<DependencySpec> {
    let requirement = requirement.trim_start();
    let name_end = requirement
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        .unwrap_or(requirement.len());
    let name = &requirement[..name_end];
    (!name.is_empty()).then(|| DependencySpec::new(name))
}

/// Reduces an interpreter requirement to the minimum version it allows.
///
/// The first clause with a lower bound wins and its operator is dropped:
/// `^3.9` and `>=3.9,<4.0` both give `3.9`. Returns `None` when no clause sets a
/// lower bound, as with `*` or `<4`.
pub fn minimum_runtime_version(requirement: &str) -> Option<String> {
    requirement
        .split([',', '|'])
        .map(str::trim)
        .filter(|clause| !clause.starts_with('<') && !clause.starts_with("!="))
        .map(|clause| {
            clause
                .trim_start_matches(['^', '~', '>', '=', ' '])
                .trim_end_matches(".*")
                .trim()
        })
        .find(|version| !version.is_empty() && *version != "*")
        .map(str::to_string)
}

impl Project {
    /// Loads the project at `path`.
    ///
    /// `path` may name the project directory or its `pyproject.toml`; a leading
    /// `~` is expanded. `poetry.lock` must sit next to `pyproject.toml`.
    pub fn load(path: &Path) -> Result<Self, BrewerError> {
        let path = expand_home(path);
        let (root, project_file) = if path.is_dir() {
            (path.clone(), path.join(PROJECT_FILE))
        } else {
            let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (root, path.clone())
        };

        if !project_file.is_file() {
            return Err(BrewerError::ProjectFileNotFound {
                path: project_file.display().to_string(),
            });
        }

        debug!("Loading project from {}", project_file.display());
        let content = std::fs::read_to_string(&project_file)?;
        let lock = LockGraph::load(&root.join(LOCK_FILE))?;

        Self::from_parts(root, &content, &project_file.display().to_string(), lock)
    }

    /// Builds a project from `pyproject.toml` text and an already-loaded lock graph.
    pub fn from_parts(
        root: PathBuf,
        content: &str,
        file: &str,
        lock: LockGraph,
    ) -> Result<Self, BrewerError> {
        let parse_error = |reason: String| BrewerError::ProjectParseError {
            file: file.to_string(),
            reason,
        };

        let raw: PyProject = toml::from_str(content).map_err(|e| parse_error(e.to_string()))?;
        let poetry = raw.tool.poetry.unwrap_or_default();
        let pep621 = raw.project.unwrap_or_default();

        let name = poetry
            .name
            .or_else(|| pep621.name.clone())
            .ok_or_else(|| parse_error("project has no name".to_string()))?;

        let metadata = ProjectMetadata {
            name,
            description: poetry.description.or_else(|| pep621.description.clone()).unwrap_or_default(),
            homepage: poetry.homepage.or_else(|| pep621.url("homepage")).unwrap_or_default(),
            repository: poetry.repository.or_else(|| pep621.url("repository")),
            documentation: poetry.documentation.or_else(|| pep621.url("documentation")),
        };

        let mut runtime_requirement = pep621.requires_python.clone();
        let mut dependencies = Vec::new();

        for (name, dependency) in &poetry.dependencies {
            if name.eq_ignore_ascii_case(RUNTIME_DEPENDENCY) {
                runtime_requirement = dependency.constraint();
                continue;
            }
            dependencies.push(DependencySpec {
                name: name.clone(),
                optional: dependency.optional(),
            });
        }

        if poetry.dependencies.is_empty() {
            for requirement in &pep621.dependencies {
                let spec = parse_requirement(requirement)
                    .ok_or_else(|| parse_error(format!("invalid requirement '{requirement}'")))?;
                dependencies.push(spec);
            }
        }

        let config = raw.tool.brewer.unwrap_or_default();
        config.validate(file)?;

        Ok(Self {
            root,
            metadata,
            runtime_requirement,
            dependencies,
            config,
            lock,
        })
    }

    /// Minimum interpreter version for `depends_on "python@X"`.
    pub fn runtime_version(&self) -> Result<String, BrewerError> {
        let requirement = self.runtime_requirement.as_deref().ok_or_else(|| {
            BrewerError::ProjectParseError {
                file: self.root.join(PROJECT_FILE).display().to_string(),
                reason: "no python version requirement declared".to_string(),
            }
        })?;

        minimum_runtime_version(requirement).ok_or_else(|| BrewerError::ProjectParseError {
            file: self.root.join(PROJECT_FILE).display().to_string(),
            reason: format!("cannot determine a minimum python version from '{requirement}'"),
        })
    }
}
