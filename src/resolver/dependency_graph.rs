//! Dependency graph over locked packages.
//!
//! The graph holds every package reachable from a project's direct dependencies,
//! with an edge from each package to the packages satisfying its requirements.
//! It provides cycle detection and the dependencies-first walk used for flattening.

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::core::BrewerError;
use crate::project::lock::{DependencySpec, LockGraph, PackageId};

/// Color states for depth-first cycle detection.
///
/// - White: not visited yet
/// - Gray: on the current DFS path
/// - Black: fully explored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Directed graph of `(name, version)` packages.
///
/// Nodes are created on first mention and edges are deduplicated, so adding the
/// same requirement from several parents yields a single node with several
/// incoming edges (a diamond).
pub struct DependencyGraph {
    graph: DiGraph<PackageId, ()>,
    node_map: HashMap<PackageId, NodeIndex>,
    roots: Vec<NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
            roots: Vec::new(),
        }
    }

    /// Builds the graph reachable from `direct` through `lock`.
    ///
    /// Optional requirements are skipped at every level, since Homebrew installs a
    /// package without its extras. A package reached through both an optional and
    /// a required edge is still included. Direct dependencies missing from the lock
    /// are reported and skipped, as are transitive requirements the lock does not
    /// contain (platform-specific packages).
    pub fn from_lock(direct: &[DependencySpec], lock: &LockGraph) -> Self {
        let mut graph = Self::new();
        let mut pending = Vec::new();

        for spec in direct {
            if spec.optional {
                debug!("Skipping optional dependency '{}'", spec.name);
                continue;
            }
            let packages = lock.find_packages(spec);
            if packages.is_empty() {
                warn!("Dependency '{}' is not in the lockfile; is it up to date?", spec.name);
            }
            for package in packages {
                let id = package.id();
                graph.add_root(id.clone());
                pending.push(package);
            }
        }

        let mut expanded = HashSet::new();
        while let Some(package) = pending.pop() {
            let from = package.id();
            if !expanded.insert(from.clone()) {
                continue;
            }

            for spec in &package.dependencies {
                if spec.optional {
                    debug!("{} has optional requirement '{}'; skipping", from, spec.name);
                    continue;
                }
                let children = lock.find_packages(spec);
                if children.is_empty() {
                    debug!("{} requires '{}', which is not locked", from, spec.name);
                }
                for child in children {
                    graph.add_dependency(from.clone(), child.id());
                    pending.push(child);
                }
            }
        }

        graph
    }

    fn ensure_node(&mut self, node: PackageId) -> NodeIndex {
        if let Some(&index) = self.node_map.get(&node) {
            index
        } else {
            let index = self.graph.add_node(node.clone());
            self.node_map.insert(node, index);
            index
        }
    }

    /// Marks `node` as a direct dependency of the project.
    pub fn add_root(&mut self, node: PackageId) {
        let index = self.ensure_node(node);
        if !self.roots.contains(&index) {
            self.roots.push(index);
        }
    }

    /// Records that `from` requires `to`.
    pub fn add_dependency(&mut self, from: PackageId, to: PackageId) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);

        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// Fails with [`BrewerError::CircularDependency`] if the graph has a cycle.
    ///
    /// The error names the cycle as a chain, e.g. `a==1 → b==2 → a==1`.
    pub fn detect_cycles(&self) -> Result<(), BrewerError> {
        let mut colors: HashMap<NodeIndex, Color> =
            self.graph.node_indices().map(|node| (node, Color::White)).collect();
        let mut path: Vec<NodeIndex> = Vec::new();

        for node in self.graph.node_indices() {
            if matches!(colors.get(&node), Some(Color::White))
                && let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path)
            {
                let chain = cycle
                    .iter()
                    .map(|&idx| self.graph[idx].to_string())
                    .collect::<Vec<_>>()
                    .join(" → ");
                return Err(BrewerError::CircularDependency {
                    chain,
                });
            }
        }

        Ok(())
    }

    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        for neighbor in self.graph.neighbors(node) {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    let start = path.iter().position(|&n| n == neighbor).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(neighbor);
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }

    /// Walks the graph from the roots, emitting each package after its dependencies.
    ///
    /// Every reachable package appears exactly once. Call [`detect_cycles`] first;
    /// on a cyclic graph the walk still terminates but the order is meaningless.
    ///
    /// [`detect_cycles`]: Self::detect_cycles
    pub fn dependencies_first(&self) -> Vec<PackageId> {
        let mut visited = HashSet::new();
        let mut order = Vec::with_capacity(self.graph.node_count());

        for &root in &self.roots {
            self.visit(root, &mut visited, &mut order);
        }
        order
    }

    fn visit(&self, node: NodeIndex, visited: &mut HashSet<NodeIndex>, order: &mut Vec<PackageId>) {
        if !visited.insert(node) {
            return;
        }
        for child in self.graph.neighbors(node) {
            self.visit(child, visited, order);
        }
        order.push(self.graph[node].clone());
    }
}

#[cfg(test)]
impl DependencyGraph {
    /// Packages directly required by `node`.
    fn get_direct_deps(&self, node: &PackageId) -> Vec<PackageId> {
        if let Some(&node_idx) = self.node_map.get(node) {
            self.graph.neighbors(node_idx).map(|idx| self.graph[idx].clone()).collect()
        } else {
            Vec::new()
        }
    }

    fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
