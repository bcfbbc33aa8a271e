//! Formula resources: one downloadable dependency package each.
//!
//! A [`Resource`] is built from exactly one of three origins, modelled by the closed
//! [`ResourceSource`] enum:
//!
//! - **Registry**: a locked package released on the package index. The index is
//!   queried for the release and the last distributable file wins.
//! - **VersionControl**: a locked package pinned to a git repository. The tarball
//!   URL follows GitHub's archive scheme `{repo}/tarball/{ref}`.
//! - **Rendered**: a `resource` block read back from an existing formula file.
//!
//! Two resources are *the same download* when their tarball URLs match
//! ([`Resource::same_source`]); resource lists are *ordered* by name
//! ([`Resource::cmp_by_name`]). The two keys differ on purpose, so neither is
//! exposed through `PartialEq` or `Ord`.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

use crate::core::BrewerError;
use crate::index::PackageIndex;
use crate::project::lock::{LockedPackage, PackageSource};

/// Where a resource's download location came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceSource {
    /// Released on the package index at an exact version.
    Registry {
        /// Locked version string
        version: String,
    },
    /// Archived from a git repository at a branch, tag or commit.
    VersionControl {
        /// Repository URL without a trailing `.git`
        repository: String,
        /// Branch, tag or commit the tarball is taken from
        reference: String,
    },
    /// Copied verbatim from a previously rendered formula.
    Rendered,
}

/// A single dependency package as recorded inside a formula.
#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    /// Package name, unique within a formula
    pub name: String,
    /// Origin of the download location
    pub source: ResourceSource,
    /// Canonical download location; the identity key of the resource
    pub tarball_url: String,
    /// SHA-256 of the tarball when known
    pub content_hash: Option<String>,
}

impl Resource {
    /// Builds a resource for any locked package, dispatching on its source kind.
    ///
    /// Registry packages cost one index request; git packages are resolved locally.
    ///
    /// # Errors
    ///
    /// - [`BrewerError::PackageNotFound`] / [`BrewerError::NetworkError`] from the index
    /// - [`BrewerError::UnsupportedSource`] for directory, file or URL sources
    pub async fn from_locked<I: PackageIndex>(
        package: &LockedPackage,
        index: &I,
    ) -> Result<Self, BrewerError> {
        match &package.source {
            PackageSource::Registry => {
                Self::from_registry(index, &package.name, &package.version).await
            }
            PackageSource::Git {
                url,
                reference,
                ..
            } => Ok(Self::from_version_control(&package.name, url, reference)),
            PackageSource::Other {
                kind,
            } => Err(BrewerError::UnsupportedSource {
                name: package.name.clone(),
                kind: kind.clone(),
            }),
        }
    }

    /// Builds a resource for a package released on the index.
    pub async fn from_registry<I: PackageIndex>(
        index: &I,
        name: &str,
        version: &str,
    ) -> Result<Self, BrewerError> {
        let release = index.release(name, version).await?;
        debug!("Resolved {}=={} to {}", name, version, release.tarball_url);

        Ok(Self {
            name: name.to_string(),
            source: ResourceSource::Registry {
                version: version.to_string(),
            },
            tarball_url: release.tarball_url,
            content_hash: release.sha256,
        })
    }

    /// Builds a resource for a package pinned to a git repository.
    ///
    /// A trailing `.git` is stripped from the repository URL before the
    /// `/tarball/{reference}` suffix is appended. No hash is available.
    pub fn from_version_control(name: &str, repository: &str, reference: &str) -> Self {
        let repository = repository.strip_suffix(".git").unwrap_or(repository);

        Self {
            name: name.to_string(),
            source: ResourceSource::VersionControl {
                repository: repository.to_string(),
                reference: reference.to_string(),
            },
            tarball_url: format!("{repository}/tarball/{reference}"),
            content_hash: None,
        }
    }

    /// Builds a resource from a `resource` block of a rendered formula.
    pub fn rendered(name: &str, url: &str, sha256: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            source: ResourceSource::Rendered,
            tarball_url: url.to_string(),
            content_hash: sha256.map(str::to_string),
        }
    }

    /// Whether both resources download the same tarball.
    ///
    /// This is the identity used for deduplication and for deciding whether an
    /// update changes formula content. Names, versions and hashes are ignored.
    pub fn same_source(&self, other: &Self) -> bool {
        self.tarball_url == other.tarball_url
    }

    /// Orders resources by name (ascending, case-sensitive).
    pub fn cmp_by_name(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }

    /// Version or git reference that tells same-named resources apart.
    fn qualifier(&self) -> Option<&str> {
        match &self.source {
            ResourceSource::Registry {
                version,
            } => Some(version),
            ResourceSource::VersionControl {
                reference,
                ..
            } => Some(reference),
            ResourceSource::Rendered => None,
        }
    }
}

/// Element-wise comparison of two resource lists under [`Resource::same_source`].
///
/// Lists are equal when they have the same length and every pair at the same
/// position downloads the same tarball.
pub fn same_resources(left: &[Resource], right: &[Resource]) -> bool {
    left.len() == right.len() && left.iter().zip(right).all(|(l, r)| l.same_source(r))
}

/// Sorts resources by name and drops later entries whose tarball is already listed.
///
/// The sort is stable, so for equal names the incoming order decides which
/// entry survives. Names left shared by several downloads (one package locked at
/// two versions) are then qualified as `{name}-{version}` or `{name}-{reference}`,
/// keeping every `resource` name in a formula unique.
///
/// # Errors
///
/// [`BrewerError::DuplicateResource`] when a name is still shared after
/// qualification.
pub fn sort_and_dedup(mut resources: Vec<Resource>) -> Result<Vec<Resource>, BrewerError> {
    resources.sort_by(Resource::cmp_by_name);

    let mut unique: Vec<Resource> = Vec::with_capacity(resources.len());
    for resource in resources {
        if unique.iter().any(|kept| kept.same_source(&resource)) {
            debug!("Dropping duplicate download for {}: {}", resource.name, resource.tarball_url);
            continue;
        }
        unique.push(resource);
    }

    let mut name_counts: HashMap<String, usize> = HashMap::new();
    for resource in &unique {
        *name_counts.entry(resource.name.clone()).or_default() += 1;
    }
    for resource in &mut unique {
        if name_counts.get(&resource.name).is_none_or(|&count| count < 2) {
            continue;
        }
        if let Some(qualifier) = resource.qualifier() {
            let qualified = format!("{}-{}", resource.name, qualifier);
            debug!("Renaming resource {} to {}", resource.name, qualified);
            resource.name = qualified;
        }
    }
    unique.sort_by(Resource::cmp_by_name);

    if let Some(pair) = unique.windows(2).find(|pair| pair[0].name == pair[1].name) {
        return Err(BrewerError::DuplicateResource {
            name: pair[0].name.clone(),
        });
    }
    Ok(unique)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{MemoryIndex, Release};

    #[test]
    fn test_version_control_strips_git_suffix() {
        let resource =
            Resource::from_version_control("tool", "https://github.com/org/tool.git", "main");
        assert_eq!(resource.tarball_url, "https://github.com/org/tool/tarball/main");
        assert!(resource.content_hash.is_none());
        assert_eq!(
            resource.source,
            ResourceSource::VersionControl {
                repository: "https://github.com/org/tool".to_string(),
                reference: "main".to_string(),
            }
        );
    }

    #[test]
    fn test_version_control_without_suffix() {
        let resource = Resource::from_version_control("tool", "https://github.com/org/tool", "v1.2");
        assert_eq!(resource.tarball_url, "https://github.com/org/tool/tarball/v1.2");
    }

    #[test]
    fn test_same_source_ignores_name_and_hash() {
        let a = Resource::rendered("alpha", "https://files/x.tar.gz", Some("aaa"));
        let b = Resource::rendered("beta", "https://files/x.tar.gz", None);
        let c = Resource::rendered("alpha", "https://files/y.tar.gz", Some("aaa"));

        assert!(a.same_source(&b));
        assert!(!a.same_source(&c));
    }

    #[test]
    fn test_cmp_by_name_is_case_sensitive() {
        let upper = Resource::rendered("Zebra", "u1", None);
        let lower = Resource::rendered("apple", "u2", None);
        assert_eq!(upper.cmp_by_name(&lower), Ordering::Less);
    }

    #[test]
    fn test_same_resources_is_positional() {
        let a = Resource::rendered("a", "u1", None);
        let b = Resource::rendered("b", "u2", None);

        assert!(same_resources(&[a.clone(), b.clone()], &[a.clone(), b.clone()]));
        assert!(!same_resources(&[a.clone(), b.clone()], &[b.clone(), a.clone()]));
        assert!(!same_resources(&[a.clone()], &[a, b]));
    }

    #[test]
    fn test_sort_and_dedup() {
        let resources = vec![
            Resource::rendered("charlie", "u3", None),
            Resource::rendered("alpha", "u1", None),
            Resource::rendered("bravo", "u1", None),
        ];

        let sorted = sort_and_dedup(resources).unwrap();
        let names: Vec<&str> = sorted.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "charlie"]);
    }

    fn registry(name: &str, version: &str) -> Resource {
        Resource {
            name: name.to_string(),
            source: ResourceSource::Registry {
                version: version.to_string(),
            },
            tarball_url: format!("https://files/{name}-{version}.tar.gz"),
            content_hash: None,
        }
    }

    #[test]
    fn test_sort_and_dedup_qualifies_shared_names() {
        let resources = vec![
            registry("numpy", "1.26.0"),
            registry("click", "8.1.3"),
            registry("numpy", "1.24.4"),
            Resource::from_version_control("tool", "https://github.com/org/tool.git", "main"),
            Resource::from_version_control("tool", "https://github.com/fork/tool.git", "v2"),
        ];

        let sorted = sort_and_dedup(resources).unwrap();
        let names: Vec<&str> = sorted.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["click", "numpy-1.24.4", "numpy-1.26.0", "tool-main", "tool-v2"]);
    }

    #[test]
    fn test_sort_and_dedup_rejects_unresolvable_names() {
        let resources = vec![
            Resource::rendered("numpy", "https://files/a.tar.gz", None),
            Resource::rendered("numpy", "https://files/b.tar.gz", None),
        ];

        let err = sort_and_dedup(resources).unwrap_err();
        assert!(matches!(err, BrewerError::DuplicateResource { ref name } if name == "numpy"));
    }

    #[tokio::test]
    async fn test_from_registry_uses_index_release() {
        let index = MemoryIndex::new().with_release(
            "click",
            "8.1.3",
            Release {
                tarball_url: "https://files.example/click-8.1.3.tar.gz".to_string(),
                sha256: Some("abc123".to_string()),
            },
        );

        let resource = Resource::from_registry(&index, "click", "8.1.3").await.unwrap();
        assert_eq!(resource.tarball_url, "https://files.example/click-8.1.3.tar.gz");
        assert_eq!(resource.content_hash.as_deref(), Some("abc123"));
        assert_eq!(
            resource.source,
            ResourceSource::Registry {
                version: "8.1.3".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_from_registry_missing_release() {
        let index = MemoryIndex::new();
        let err = Resource::from_registry(&index, "ghost", "0.1.0").await.unwrap_err();
        assert!(matches!(err, BrewerError::PackageNotFound { .. }));
    }

    #[tokio::test]
    async fn test_from_locked_rejects_directory_sources() {
        let package = LockedPackage {
            name: "local".to_string(),
            version: "0.1.0".to_string(),
            source: PackageSource::Other {
                kind: "directory".to_string(),
            },
            dependencies: Vec::new(),
        };

        let err = Resource::from_locked(&package, &MemoryIndex::new()).await.unwrap_err();
        assert!(matches!(err, BrewerError::UnsupportedSource { ref kind, .. } if kind == "directory"));
    }
}
