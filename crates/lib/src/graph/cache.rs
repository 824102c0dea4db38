//! Memoization of node evaluations.
//!
//! A node's cache key covers its spec, the toolchain configuration and the
//! keys of its dependencies, so a change anywhere upstream invalidates every
//! node below it. Only successful outcomes are stored.

use std::collections::HashMap;

use serde::Serialize;

use super::types::{NodeOutcome, NodeSpec};
use crate::toolchain::ToolchainConfig;
use crate::util::hash::{HashError, Hashable, ObjectHash};

#[derive(Serialize)]
struct CacheKeyInput<'a> {
  node: &'a NodeSpec,
  toolchain: &'a ToolchainConfig,
  deps: &'a [ObjectHash],
}

impl Hashable for CacheKeyInput<'_> {}

/// Compute the cache key of `node`.
///
/// `dep_keys` must be the keys of the node's dependencies, in declaration order.
pub fn cache_key(
  node: &NodeSpec,
  toolchain: &ToolchainConfig,
  dep_keys: &[ObjectHash],
) -> Result<ObjectHash, HashError> {
  CacheKeyInput {
    node,
    toolchain,
    deps: dep_keys,
  }
  .compute_hash()
}

/// Outcomes of previous evaluations, keyed by [`cache_key`].
#[derive(Debug, Default)]
pub struct NodeCache {
  entries: HashMap<ObjectHash, NodeOutcome>,
}

impl NodeCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, key: &ObjectHash) -> Option<&NodeOutcome> {
    self.entries.get(key)
  }

  /// Store a successful outcome. The stored copy is never marked as cached.
  pub fn insert(&mut self, key: ObjectHash, outcome: &NodeOutcome) {
    let stored = NodeOutcome {
      cached: false,
      ..outcome.clone()
    };
    self.entries.insert(key, stored);
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::artifact::ArtifactDescriptor;
  use crate::context::CompilationContext;
  use crate::graph::types::ImportSpec;
  use crate::merge::merge_native;

  fn foo() -> NodeSpec {
    NodeSpec::Import(ImportSpec {
      descriptor: ArtifactDescriptor::new("Foo").with_module("Foo.swiftmodule"),
      deps: vec![],
    })
  }

  fn outcome() -> NodeOutcome {
    NodeOutcome {
      bundle: Arc::new(merge_native("Zlib", &CompilationContext::default(), &[], &[], &[])),
      decision: None,
      diagnostics: vec![],
      cached: true,
    }
  }

  #[test]
  fn key_is_stable() {
    let config = ToolchainConfig::default();
    assert_eq!(cache_key(&foo(), &config, &[]).unwrap(), cache_key(&foo(), &config, &[]).unwrap());
  }

  #[test]
  fn key_depends_on_toolchain() {
    let a = ToolchainConfig::default();
    let b = ToolchainConfig {
      out_dir: "elsewhere".to_string(),
      ..Default::default()
    };
    assert_ne!(cache_key(&foo(), &a, &[]).unwrap(), cache_key(&foo(), &b, &[]).unwrap());
  }

  #[test]
  fn key_depends_on_dependency_keys() {
    let config = ToolchainConfig::default();
    let dep = ObjectHash("0123456789abcdef0123".to_string());
    assert_ne!(cache_key(&foo(), &config, &[]).unwrap(), cache_key(&foo(), &config, &[dep]).unwrap());
  }

  #[test]
  fn insert_clears_cached_flag() {
    let mut cache = NodeCache::new();
    let key = ObjectHash("k".to_string());
    cache.insert(key.clone(), &outcome());

    assert_eq!(cache.len(), 1);
    assert!(!cache.get(&key).unwrap().cached);
    assert!(cache.get(&ObjectHash("other".to_string())).is_none());
  }
}
