//! Dependency flattening and resource resolution.
//!
//! Turns a project's direct dependencies and lock graph into the sorted,
//! deduplicated resource list a formula embeds:
//!
//! 1. [`flatten`] walks the transitive closure (dependencies first), rejects
//!    cycles, keeps one entry per `(name, version)` and drops excluded names.
//! 2. [`resolve_resources`] builds a [`Resource`] for every flattened package,
//!    running registry lookups with bounded concurrency, then sorts by name and
//!    drops duplicate downloads.
//!
//! Deduplication happens before any lookup, so a package shared by several
//! parents costs exactly one index request.

pub mod dependency_graph;

use futures::{StreamExt, TryStreamExt, stream};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

use crate::core::BrewerError;
use crate::formula::resource::{Resource, sort_and_dedup};
use crate::index::PackageIndex;
use crate::project::lock::{DependencySpec, LockGraph, LockedPackage, PackageId, canonicalize_name};
use crate::utils::ProgressBar;

pub use dependency_graph::DependencyGraph;

/// Flattens the lock graph reachable from `direct` into a package list.
///
/// `exclude` holds canonical names; an excluded package is dropped on its own, its
/// dependencies stay unless excluded too. The result is sorted by name.
///
/// # Errors
///
/// [`BrewerError::CircularDependency`] when the reachable graph has a cycle.
pub fn flatten(
    direct: &[DependencySpec],
    lock: &LockGraph,
    exclude: &BTreeSet<String>,
) -> Result<Vec<LockedPackage>, BrewerError> {
    let graph = DependencyGraph::from_lock(direct, lock);
    graph.detect_cycles()?;

    let by_id: HashMap<PackageId, &LockedPackage> =
        lock.packages().iter().map(|package| (package.id(), package)).collect();

    let mut seen = HashSet::new();
    let mut packages = Vec::new();
    for id in graph.dependencies_first() {
        if !seen.insert(id.clone()) {
            continue;
        }
        if exclude.contains(&canonicalize_name(&id.name)) {
            debug!("Excluding {}", id);
            continue;
        }
        if let Some(package) = by_id.get(&id) {
            packages.push((*package).clone());
        }
    }

    packages.sort_by(|a, b| a.name.cmp(&b.name));
    debug!("Flattened {} packages from {} direct dependencies", packages.len(), direct.len());
    Ok(packages)
}

/// Builds resources for flattened packages.
///
/// At most `max_parallel` lookups are in flight. The first failure aborts the
/// whole resolution; no partial list is returned.
pub async fn resolve_resources<I: PackageIndex>(
    packages: &[LockedPackage],
    index: &I,
    max_parallel: usize,
    progress: &ProgressBar,
) -> Result<Vec<Resource>, BrewerError> {
    let resolved: Result<Vec<Resource>, BrewerError> = stream::iter(packages)
        .map(|package| {
            let progress = progress.clone();
            async move {
                progress.set_message(package.name.clone());
                let resource = Resource::from_locked(package, index).await;
                progress.inc(1);
                resource
            }
        })
        .buffered(max_parallel.max(1))
        .try_collect()
        .await;

    progress.finish_and_clear();
    sort_and_dedup(resolved?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{MemoryIndex, Release};
    use crate::project::lock::PackageSource;

    fn names(packages: &[LockedPackage]) -> Vec<&str> {
        packages.iter().map(|p| p.name.as_str()).collect()
    }

    fn diamond_lock() -> LockGraph {
        // app-a -> shared, app-b -> shared, shared -> base
        LockGraph::new(vec![
            LockedPackage::registry("app-a", "1.0").depends_on("shared"),
            LockedPackage::registry("app-b", "2.0").depends_on("Shared"),
            LockedPackage::registry("shared", "3.0").depends_on("base"),
            LockedPackage::registry("base", "0.1"),
            LockedPackage::registry("unrelated", "9.9"),
        ])
    }

    #[test]
    fn test_flatten_diamond_once() {
        let direct = [DependencySpec::new("app-b"), DependencySpec::new("app-a")];
        let packages = flatten(&direct, &diamond_lock(), &BTreeSet::new()).unwrap();

        assert_eq!(names(&packages), vec!["app-a", "app-b", "base", "shared"]);
    }

    #[test]
    fn test_flatten_exclude_keeps_children() {
        let direct = [DependencySpec::new("app-a")];
        let exclude = BTreeSet::from(["shared".to_string()]);
        let packages = flatten(&direct, &diamond_lock(), &exclude).unwrap();

        assert_eq!(names(&packages), vec!["app-a", "base"]);
    }

    #[test]
    fn test_flatten_order_independent() {
        let forward = flatten(
            &[DependencySpec::new("app-a"), DependencySpec::new("app-b")],
            &diamond_lock(),
            &BTreeSet::new(),
        )
        .unwrap();
        let backward = flatten(
            &[DependencySpec::new("app-b"), DependencySpec::new("app-a")],
            &diamond_lock(),
            &BTreeSet::new(),
        )
        .unwrap();

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_flatten_keeps_multiple_versions() {
        let lock = LockGraph::new(vec![
            LockedPackage::registry("tool", "1.0").depends_on("numpy"),
            LockedPackage::registry("numpy", "1.24.4"),
            LockedPackage::registry("numpy", "1.26.0"),
        ]);

        let packages = flatten(&[DependencySpec::new("tool")], &lock, &BTreeSet::new()).unwrap();
        let numpy: Vec<&str> =
            packages.iter().filter(|p| p.name == "numpy").map(|p| p.version.as_str()).collect();
        assert_eq!(numpy.len(), 2);
    }

    #[test]
    fn test_flatten_cycle_fails() {
        let lock = LockGraph::new(vec![
            LockedPackage::registry("a", "1").depends_on("b"),
            LockedPackage::registry("b", "1").depends_on("a"),
        ]);

        let err = flatten(&[DependencySpec::new("a")], &lock, &BTreeSet::new()).unwrap_err();
        assert!(matches!(err, BrewerError::CircularDependency { .. }));
    }

    #[tokio::test]
    async fn test_resolve_resources_mixed_sources() {
        let packages = vec![
            LockedPackage::registry("zeta", "1.0"),
            LockedPackage {
                name: "alpha".to_string(),
                version: "0.1.0".to_string(),
                source: PackageSource::Git {
                    url: "https://github.com/org/alpha.git".to_string(),
                    reference: "main".to_string(),
                },
                dependencies: Vec::new(),
            },
        ];
        let index = MemoryIndex::new().with_release(
            "zeta",
            "1.0",
            Release {
                tarball_url: "https://files/zeta-1.0.tar.gz".to_string(),
                sha256: Some("feed".to_string()),
            },
        );

        let resources =
            resolve_resources(&packages, &index, 2, &ProgressBar::new(2, false)).await.unwrap();

        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].tarball_url, "https://github.com/org/alpha/tarball/main");
        assert_eq!(resources[1].content_hash.as_deref(), Some("feed"));
    }

    #[tokio::test]
    async fn test_resolve_resources_aborts_on_lookup_failure() {
        let packages = vec![LockedPackage::registry("ghost", "0.0.1")];
        let err = resolve_resources(&packages, &MemoryIndex::new(), 4, &ProgressBar::new(1, false))
            .await
            .unwrap_err();
        assert!(matches!(err, BrewerError::PackageNotFound { .. }));
    }
}
