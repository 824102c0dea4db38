//! Types for graph manifests and graph runs.
//!
//! This module defines the manifest format, the per-node outcomes and the
//! error types produced while evaluating a whole graph.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artifact::{Artifact, ArtifactDescriptor};
use crate::context::CompilationContext;
use crate::eval::EvalError;
use crate::merge::MetadataBundle;
use crate::select::{Diagnostic, PathDecision};
use crate::toolchain::ToolchainConfig;

/// An import node plus the names of the nodes it depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpec {
  #[serde(flatten)]
  pub descriptor: ArtifactDescriptor,
  /// Dependency edges, in declaration order.
  #[serde(default)]
  pub deps: Vec<String>,
}

/// A native library whose metadata is already known.
///
/// Native libraries are not evaluated: their bundle is assembled directly
/// from the declared headers and archives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeLibrarySpec {
  pub name: String,
  #[serde(flatten)]
  pub context: CompilationContext,
  #[serde(default)]
  pub archives: Vec<Artifact>,
  #[serde(default)]
  pub always_link: bool,
  #[serde(default)]
  pub deps: Vec<String>,
}

/// One node of a graph manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeSpec {
  Import(ImportSpec),
  Native(NativeLibrarySpec),
}

impl NodeSpec {
  pub fn name(&self) -> &str {
    match self {
      NodeSpec::Import(spec) => &spec.descriptor.name,
      NodeSpec::Native(spec) => &spec.name,
    }
  }

  pub fn deps(&self) -> &[String] {
    match self {
      NodeSpec::Import(spec) => &spec.deps,
      NodeSpec::Native(spec) => &spec.deps,
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      NodeSpec::Import(_) => "import",
      NodeSpec::Native(_) => "native",
    }
  }
}

/// A graph of nodes sharing one toolchain configuration.
///
/// # Example
///
/// ```json
/// {
///   "toolchain": { "compiler": "swiftc", "out_dir": "out" },
///   "nodes": [
///     { "kind": "native", "name": "Zlib", "include_dirs": ["zlib/include"], "archives": ["libz.a"] },
///     { "kind": "import", "name": "Foo", "interface_file": "Foo.swiftinterface", "deps": ["Zlib"] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphManifest {
  #[serde(default)]
  pub toolchain: ToolchainConfig,
  #[serde(default)]
  pub nodes: Vec<NodeSpec>,
}

impl GraphManifest {
  pub fn from_json(json: &str) -> Result<Self, GraphError> {
    serde_json::from_str(json).map_err(|e| GraphError::Parse(e.to_string()))
  }

  pub fn from_path(path: &Path) -> Result<Self, GraphError> {
    let content = std::fs::read_to_string(path).map_err(|e| GraphError::Read {
      path: path.display().to_string(),
      message: e.to_string(),
    })?;
    Self::from_json(&content)
  }
}

/// Errors that prevent a graph from being run at all.
#[derive(Debug, Error)]
pub enum GraphError {
  #[error("failed to read {path}: {message}")]
  Read { path: String, message: String },

  #[error("invalid graph manifest: {0}")]
  Parse(String),

  #[error("node {0} is declared more than once")]
  DuplicateNode(String),

  #[error("node {node} depends on unknown node {dep}")]
  UnknownDependency { node: String, dep: String },

  #[error("dependency cycle detected")]
  CycleDetected,

  #[error("failed to compute cache key for {node}: {message}")]
  CacheKey { node: String, message: String },

  #[error("graph run interrupted")]
  Interrupted,
}

/// Why a node failed.
#[derive(Debug, Clone, Error)]
pub enum NodeFailure {
  #[error(transparent)]
  Eval(#[from] EvalError),

  #[error("evaluation task panicked: {0}")]
  Panicked(String),
}

/// Names the dependency whose failure caused a node to be skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDependency(pub String);

impl std::fmt::Display for FailedDependency {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "dependency {} failed", self.0)
  }
}

/// A successfully evaluated node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOutcome {
  pub bundle: Arc<MetadataBundle>,
  /// Path taken; `None` for native libraries.
  pub decision: Option<PathDecision>,
  pub diagnostics: Vec<Diagnostic>,
  /// Whether the outcome was served from the runner's cache.
  pub cached: bool,
}

/// Result of running a whole graph.
#[derive(Debug, Default)]
pub struct GraphResult {
  pub evaluated: BTreeMap<String, NodeOutcome>,
  pub failed: BTreeMap<String, NodeFailure>,
  /// Nodes not evaluated because a dependency failed or was skipped.
  pub skipped: BTreeMap<String, FailedDependency>,
  /// Node names in the order they were settled, wave by wave.
  pub order: Vec<String>,
}

impl GraphResult {
  /// Returns true if every node was evaluated.
  pub fn is_success(&self) -> bool {
    self.failed.is_empty() && self.skipped.is_empty()
  }

  /// Returns the total number of nodes processed.
  pub fn total(&self) -> usize {
    self.evaluated.len() + self.failed.len() + self.skipped.len()
  }

  pub fn bundle(&self, name: &str) -> Option<&Arc<MetadataBundle>> {
    self.evaluated.get(name).map(|o| &o.bundle)
  }

  /// All diagnostics, in settle order.
  pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
    self
      .order
      .iter()
      .filter_map(|name| self.evaluated.get(name))
      .flat_map(|o| o.diagnostics.iter())
  }

  /// Whether `name` failed or was skipped.
  pub fn is_unavailable(&self, name: &str) -> bool {
    self.failed.contains_key(name) || self.skipped.contains_key(name)
  }
}

/// Configuration for graph runs.
#[derive(Debug, Clone)]
pub struct RunConfig {
  /// Maximum number of nodes evaluated in parallel.
  pub parallelism: usize,
}

impl Default for RunConfig {
  fn default() -> Self {
    Self {
      parallelism: num_cpus(),
    }
  }
}

/// Get the number of CPUs for default parallelism.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}
