//! Dependency DAG for graph manifests.
//!
//! This module validates node names and dependency edges, rejects cycles and
//! groups nodes into waves that can be evaluated in parallel.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use super::types::{GraphError, GraphManifest};

/// A DAG over the nodes of a manifest.
///
/// Graph nodes carry the position of the node in `GraphManifest::nodes`;
/// edges run from dependency to dependent.
pub struct GraphDag {
  graph: DiGraph<usize, ()>,

  /// Map from node name to graph index.
  indices: HashMap<String, NodeIndex>,

  /// Direct dependencies of each node, in declaration order.
  deps: HashMap<String, Vec<String>>,
}

impl GraphDag {
  /// Build the DAG of `manifest`.
  ///
  /// # Errors
  ///
  /// - `DuplicateNode` if two nodes share a name
  /// - `UnknownDependency` if a node depends on a name not in the manifest
  /// - `CycleDetected` if the dependencies form a cycle
  pub fn from_manifest(manifest: &GraphManifest) -> Result<Self, GraphError> {
    let mut graph = DiGraph::new();
    let mut indices = HashMap::new();
    let mut deps = HashMap::new();

    // First pass: one graph node per manifest node
    for (position, node) in manifest.nodes.iter().enumerate() {
      let name = node.name().to_string();
      if indices.contains_key(&name) {
        return Err(GraphError::DuplicateNode(name));
      }
      let idx = graph.add_node(position);
      indices.insert(name.clone(), idx);
      deps.insert(name, node.deps().to_vec());
    }

    // Second pass: edges from dependency to dependent
    for node in &manifest.nodes {
      let dependent_idx = indices[node.name()];
      for dep in node.deps() {
        let Some(&dep_idx) = indices.get(dep) else {
          return Err(GraphError::UnknownDependency {
            node: node.name().to_string(),
            dep: dep.clone(),
          });
        };
        graph.add_edge(dep_idx, dependent_idx, ());
      }
    }

    let dag = Self { graph, indices, deps };

    dag.verify_acyclic()?;

    Ok(dag)
  }

  fn verify_acyclic(&self) -> Result<(), GraphError> {
    toposort(&self.graph, None).map_err(|_| GraphError::CycleDetected)?;
    Ok(())
  }

  /// Group nodes into waves.
  ///
  /// Every node's dependencies lie in earlier waves. Within a wave, nodes keep
  /// their manifest order. Each entry is a position in `GraphManifest::nodes`.
  pub fn waves(&self) -> Result<Vec<Vec<usize>>, GraphError> {
    // Kahn's algorithm, one level at a time
    let mut in_degree: HashMap<NodeIndex, usize> = self
      .graph
      .node_indices()
      .map(|idx| (idx, self.graph.neighbors_directed(idx, Direction::Incoming).count()))
      .collect();
    let mut remaining: HashSet<NodeIndex> = self.graph.node_indices().collect();
    let mut waves = Vec::new();

    while !remaining.is_empty() {
      let ready: Vec<NodeIndex> = self
        .graph
        .node_indices()
        .filter(|idx| remaining.contains(idx) && in_degree[idx] == 0)
        .collect();

      if ready.is_empty() {
        return Err(GraphError::CycleDetected);
      }

      for &idx in &ready {
        remaining.remove(&idx);
        for neighbor in self.graph.neighbors_directed(idx, Direction::Outgoing) {
          if let Some(deg) = in_degree.get_mut(&neighbor) {
            *deg = deg.saturating_sub(1);
          }
        }
      }

      waves.push(ready.into_iter().map(|idx| self.graph[idx]).collect());
    }

    Ok(waves)
  }

  /// Direct dependencies of `name`, in declaration order.
  pub fn dependencies(&self, name: &str) -> &[String] {
    self.deps.get(name).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Check if a node has any dependencies.
  pub fn has_dependencies(&self, name: &str) -> bool {
    !self.dependencies(name).is_empty()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.indices.contains_key(name)
  }

  pub fn node_count(&self) -> usize {
    self.graph.node_count()
  }
}
