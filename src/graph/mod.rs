//! Package dependency graph for gate and publish ordering
//!
//! The native library is released alongside packages that bind against it,
//! so gates and registry publishes must visit dependencies first. The graph
//! is tiny (a handful of packages) but the ordering rule is structural, so
//! it is computed with a petgraph toposort rather than relying on config
//! file order.

use std::collections::HashMap;

use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::core::config::PackageConfig;
use crate::core::error::{ReleaseError, ReleaseResult};

/// Dependency-ordered view of the configured packages
///
/// `A → B` means "A depends on B"; the release order is dependencies first.
#[derive(Debug)]
pub struct PackageGraph {
  order: Vec<String>,
  rank: HashMap<String, usize>,
}

impl PackageGraph {
  /// Build the graph from config and toposort it
  pub fn build(packages: &[PackageConfig]) -> ReleaseResult<Self> {
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut nodes: HashMap<String, NodeIndex> = HashMap::new();

    for package in packages {
      let idx = graph.add_node(package.name.clone());
      nodes.insert(package.name.clone(), idx);
    }

    for package in packages {
      for dep in &package.depends_on {
        // Config validation guarantees the dep exists
        if let (Some(&from), Some(&to)) = (nodes.get(&package.name), nodes.get(dep)) {
          graph.add_edge(from, to, ());
        }
      }
    }

    let topo = algo::toposort(&graph, None).map_err(|cycle| {
      ReleaseError::with_help(
        format!("Dependency cycle involving package '{}'", graph[cycle.node_id()]),
        "Break the cycle in the depends_on entries of release.toml",
      )
    })?;

    // toposort visits dependents before dependencies for our edge
    // direction; reverse so dependencies come first
    let order: Vec<String> = topo.into_iter().rev().map(|idx| graph[idx].clone()).collect();
    let rank = order.iter().enumerate().map(|(i, name)| (name.clone(), i)).collect();

    Ok(Self { order, rank })
  }

  /// Names in release order (dependencies first)
  pub fn order(&self) -> &[String] {
    &self.order
  }

  /// Ordinal of a package; unknown names sort last
  pub fn rank(&self, name: &str) -> usize {
    self.rank.get(name).copied().unwrap_or(usize::MAX)
  }

  /// Stable-sort items by the graph rank of the package they belong to
  pub fn sort_by_package<T, F>(&self, items: &mut [T], package_of: F)
  where
    F: Fn(&T) -> &str,
  {
    items.sort_by_key(|item| self.rank(package_of(item)));
  }
}
