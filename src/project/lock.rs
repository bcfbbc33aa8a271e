//! Resolved lock graph read from `poetry.lock`.
//!
//! The lockfile lists every resolved package once per version as a `[[package]]`
//! table. Each package names its own requirements under `[package.dependencies]`,
//! which is what turns the flat list into a graph: a [`DependencySpec`] is looked
//! up with [`LockGraph::find_packages`] to get the concrete packages satisfying it.
//!
//! ```toml
//! [[package]]
//! name = "click"
//! version = "8.1.3"
//!
//! [package.dependencies]
//! colorama = {version = "*", markers = "platform_system == \"Windows\""}
//!
//! [[package]]
//! name = "rich-click"
//! version = "1.6.0"
//!
//! [package.source]
//! type = "git"
//! url = "https://github.com/ewels/rich-click.git"
//! reference = "main"
//! resolved_reference = "4f1c2d0"
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::core::BrewerError;

/// Normalizes a package name the way Python packaging compares names.
///
/// Lower-cases the name and folds every run of `-`, `_` and `.` into a single `-`,
/// so `Typing_Extensions` and `typing-extensions` compare equal.
pub fn canonicalize_name(name: &str) -> String {
    let mut canonical = String::with_capacity(name.len());
    let mut in_separator = false;

    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                canonical.push('-');
                in_separator = true;
            }
        } else {
            canonical.extend(c.to_lowercase());
            in_separator = false;
        }
    }

    canonical
}

/// A requirement on another package, as written by the resolver.
///
/// Version constraints are not kept: the lockfile already pins the version chosen
/// for every requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    /// Required package name
    pub name: String,
    /// Whether the requirement only applies when an extra is requested
    pub optional: bool,
}

impl DependencySpec {
    /// Creates a required dependency on `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
        }
    }

    /// Marks the requirement as extras-only.
    #[must_use]
    pub fn as_optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Where a locked package is downloaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageSource {
    /// The default package index.
    Registry,
    /// A git repository at a given reference.
    Git {
        /// Repository URL as locked (may end in `.git`)
        url: String,
        /// Branch, tag or commit requested by the project, else the locked commit
        reference: String,
    },
    /// Any other source kind (`directory`, `file`, `url`, `legacy`, ...).
    Other {
        /// Source type recorded in the lockfile
        kind: String,
    },
}

/// One concrete package from the lockfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedPackage {
    /// Package name as recorded in the lockfile
    pub name: String,
    /// Exact resolved version
    pub version: String,
    /// Download origin
    pub source: PackageSource,
    /// Requirements of this package
    pub dependencies: Vec<DependencySpec>,
}

impl LockedPackage {
    /// Creates a registry package without dependencies.
    pub fn registry(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            source: PackageSource::Registry,
            dependencies: Vec::new(),
        }
    }

    /// Adds a required dependency on `name`.
    #[must_use]
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(DependencySpec::new(name));
        self
    }

    /// Identity of this package inside the graph.
    pub fn id(&self) -> PackageId {
        PackageId {
            name: self.name.clone(),
            version: self.version.clone(),
        }
    }
}

/// `(name, version)` pair identifying one locked package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId {
    /// Package name
    pub name: String,
    /// Exact version
    pub version: String,
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=={}", self.name, self.version)
    }
}

/// The resolver's output: every locked package and its requirements.
#[derive(Debug, Clone, Default)]
pub struct LockGraph {
    packages: Vec<LockedPackage>,
}

#[derive(Debug, Deserialize)]
struct RawLock {
    #[serde(default, rename = "package")]
    packages: Vec<RawPackage>,
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    name: String,
    version: String,
    #[serde(default)]
    dependencies: BTreeMap<String, toml::Value>,
    source: Option<RawSource>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(rename = "type")]
    kind: String,
    url: Option<String>,
    reference: Option<String>,
    resolved_reference: Option<String>,
}

/// Reads one `[package.dependencies]` entry.
///
/// The value is a constraint string, a table, or an array of tables (one per
/// marker split). Each table yields its own spec; `optional = true` marks it
/// extras-only.
fn dependency_specs(name: &str, value: &toml::Value) -> Vec<DependencySpec> {
    let spec = |entry: &toml::Value| {
        let optional = entry.get("optional").and_then(toml::Value::as_bool).unwrap_or(false);
        DependencySpec {
            name: name.to_string(),
            optional,
        }
    };

    match value {
        toml::Value::Array(entries) => entries.iter().map(spec).collect(),
        other => vec![spec(other)],
    }
}

impl RawSource {
    fn into_source(self, package: &str, file: &str) -> Result<PackageSource, BrewerError> {
        if self.kind != "git" {
            return Ok(PackageSource::Other {
                kind: self.kind,
            });
        }

        let url = self.url.ok_or_else(|| BrewerError::LockfileParseError {
            file: file.to_string(),
            reason: format!("git source of '{package}' has no url"),
        })?;
        let reference =
            self.reference.or(self.resolved_reference).unwrap_or_else(|| "HEAD".to_string());

        Ok(PackageSource::Git {
            url,
            reference,
        })
    }
}

impl LockGraph {
    /// Creates a graph from already-parsed packages.
    pub fn new(packages: Vec<LockedPackage>) -> Self {
        Self {
            packages,
        }
    }

    /// Reads and parses a `poetry.lock` file.
    pub fn load(path: &Path) -> Result<Self, BrewerError> {
        if !path.exists() {
            return Err(BrewerError::LockfileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parses lockfile text; `file` is only used in error messages.
    pub fn parse(content: &str, file: &str) -> Result<Self, BrewerError> {
        let raw: RawLock = toml::from_str(content).map_err(|e| BrewerError::LockfileParseError {
            file: file.to_string(),
            reason: e.to_string(),
        })?;

        let mut packages = Vec::with_capacity(raw.packages.len());
        for package in raw.packages {
            let source = match package.source {
                Some(source) => source.into_source(&package.name, file)?,
                None => PackageSource::Registry,
            };
            let dependencies = package
                .dependencies
                .into_iter()
                .flat_map(|(name, value)| dependency_specs(&name, &value))
                .collect();

            packages.push(LockedPackage {
                name: package.name,
                version: package.version,
                source,
                dependencies,
            });
        }

        debug!("Parsed {} locked packages from {}", packages.len(), file);
        Ok(Self {
            packages,
        })
    }

    /// All locked packages in file order.
    pub fn packages(&self) -> &[LockedPackage] {
        &self.packages
    }

    /// Concrete packages that satisfy `spec`.
    ///
    /// Matching is by canonical name only: the lockfile already holds the single
    /// resolution chosen for each requirement, and when a name is locked at several
    /// versions (marker splits) every one of them is returned.
    pub fn find_packages(&self, spec: &DependencySpec) -> Vec<&LockedPackage> {
        let wanted = canonicalize_name(&spec.name);
        self.packages.iter().filter(|p| canonicalize_name(&p.name) == wanted).collect()
    }
}
