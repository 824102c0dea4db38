//! Whole-graph evaluation.
//!
//! The evaluator itself handles one node at a time. This module is the host
//! side: it orders the nodes of a [`GraphManifest`], feeds each node the
//! bundles of its dependencies and collects the results. It handles:
//! - DAG validation and wave ordering
//! - Parallel evaluation of independent nodes
//! - Failure propagation and skip tracking
//! - Memoization of successful evaluations across runs

pub mod cache;
pub mod dag;
pub mod types;

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::context::LibraryDescriptor;
use crate::eval::{EvalError, evaluate};
use crate::merge::{MetadataBundle, merge_native};
use crate::select::{Diagnostic, PathDecision, select_path};
use crate::toolchain::{Toolchain, ToolchainConfig};
use crate::util::hash::ObjectHash;

pub use cache::{NodeCache, cache_key};
pub use dag::GraphDag;
pub use types::{
  FailedDependency, GraphError, GraphManifest, GraphResult, ImportSpec, NativeLibrarySpec, NodeFailure, NodeOutcome,
  NodeSpec, RunConfig,
};

/// Evaluates graph manifests against one toolchain.
///
/// The runner keeps a [`NodeCache`] between runs: a node whose spec,
/// toolchain configuration and upstream nodes are unchanged is not evaluated
/// again, so the toolchain sees at most one call per distinct input.
pub struct GraphRunner {
  toolchain: Arc<dyn Toolchain>,
  config: RunConfig,
  cache: NodeCache,
}

/// A node waiting for evaluation in the current wave.
struct PendingNode {
  position: usize,
  name: String,
  key: ObjectHash,
  spec: NodeSpec,
  deps: Vec<Arc<MetadataBundle>>,
}

impl GraphRunner {
  pub fn new(toolchain: Arc<dyn Toolchain>, config: RunConfig) -> Self {
    Self {
      toolchain,
      config,
      cache: NodeCache::new(),
    }
  }

  pub fn cache(&self) -> &NodeCache {
    &self.cache
  }

  /// Evaluate every node of `manifest`.
  ///
  /// Nodes run wave by wave; nodes within a wave run in parallel, bounded by
  /// `RunConfig::parallelism`. A node whose dependency failed or was skipped
  /// is skipped in turn. Node failures never abort the run: they are recorded
  /// in the returned [`GraphResult`].
  ///
  /// # Errors
  ///
  /// Returns an error only if the manifest itself is invalid (duplicate
  /// names, unknown dependencies, cycles) or a cache key cannot be computed.
  pub async fn run(&mut self, manifest: &GraphManifest) -> Result<GraphResult, GraphError> {
    info!(node_count = manifest.nodes.len(), "starting graph run");

    let dag = GraphDag::from_manifest(manifest)?;
    let waves = dag.waves()?;

    info!(wave_count = waves.len(), "computed evaluation waves");

    let toolchain_config = Arc::new(manifest.toolchain.clone());
    let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));

    let mut result = GraphResult::default();
    let mut keys: HashMap<String, ObjectHash> = HashMap::new();

    for (wave_idx, wave) in waves.iter().enumerate() {
      debug!(wave = wave_idx, nodes = wave.len(), "evaluating wave");

      let mut settled: Vec<(usize, String)> = Vec::new();
      let mut pending = Vec::new();

      for &position in wave {
        let spec = &manifest.nodes[position];
        let name = spec.name().to_string();
        let deps = dag.dependencies(&name);

        // Dependencies live in earlier waves, so their keys are known
        let dep_keys: Vec<ObjectHash> = deps.iter().filter_map(|d| keys.get(d).cloned()).collect();
        let key = cache_key(spec, &toolchain_config, &dep_keys).map_err(|e| GraphError::CacheKey {
          node: name.clone(),
          message: e.to_string(),
        })?;
        keys.insert(name.clone(), key.clone());

        if let Some(failed_dep) = deps.iter().find(|d| result.is_unavailable(d)) {
          warn!(node = %name, failed_dep = %failed_dep, "skipping node due to failed dependency");
          result.skipped.insert(name.clone(), FailedDependency(failed_dep.clone()));
          settled.push((position, name));
          continue;
        }

        if let Some(hit) = self.cache.get(&key) {
          debug!(node = %name, key = %key, "using cached evaluation");
          let outcome = NodeOutcome {
            cached: true,
            ..hit.clone()
          };
          result.evaluated.insert(name.clone(), outcome);
          settled.push((position, name));
          continue;
        }

        let dep_bundles = deps.iter().filter_map(|d| result.bundle(d).cloned()).collect();
        pending.push(PendingNode {
          position,
          name,
          key,
          spec: spec.clone(),
          deps: dep_bundles,
        });
      }

      if !pending.is_empty() {
        let wave_results = self.evaluate_wave(pending, &toolchain_config, &semaphore).await?;

        for (position, name, key, outcome) in wave_results {
          match outcome {
            Ok(outcome) => {
              info!(node = %name, "node evaluated");
              self.cache.insert(key, &outcome);
              result.evaluated.insert(name.clone(), outcome);
            }
            Err(e) => {
              error!(node = %name, error = %e, "node failed");
              result.failed.insert(name.clone(), e);
            }
          }
          settled.push((position, name));
        }
      }

      settled.sort_by_key(|(position, _)| *position);
      result.order.extend(settled.into_iter().map(|(_, name)| name));
    }

    info!(
      evaluated = result.evaluated.len(),
      failed = result.failed.len(),
      skipped = result.skipped.len(),
      "graph run complete"
    );

    Ok(result)
  }

  /// Evaluate the nodes of one wave in parallel.
  async fn evaluate_wave(
    &self,
    pending: Vec<PendingNode>,
    toolchain_config: &Arc<ToolchainConfig>,
    semaphore: &Arc<Semaphore>,
  ) -> Result<Vec<(usize, String, ObjectHash, Result<NodeOutcome, NodeFailure>)>, GraphError> {
    let mut join_set = JoinSet::new();
    let mut unsettled: HashMap<String, (usize, ObjectHash)> = HashMap::new();

    for node in pending {
      // Acquire before spawning so at most `parallelism` evaluations run
      let permit = semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| GraphError::Interrupted)?;
      let toolchain = self.toolchain.clone();
      let config = toolchain_config.clone();
      unsettled.insert(node.name.clone(), (node.position, node.key.clone()));

      join_set.spawn_blocking(move || {
        let _permit = permit;
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
          evaluate_node(&node.spec, &node.deps, toolchain.as_ref(), &config)
        }))
        .unwrap_or_else(|payload| Err(NodeFailure::Panicked(panic_message(payload.as_ref()))));
        (node.position, node.name, node.key, outcome)
      });
    }

    let mut results = Vec::new();

    while let Some(joined) = join_set.join_next().await {
      match joined {
        Ok((position, name, key, outcome)) => {
          unsettled.remove(&name);
          results.push((position, name, key, outcome));
        }
        Err(e) => {
          error!(error = %e, "evaluation task failed");
        }
      }
    }

    // Tasks that never reported back still need a result
    for (name, (position, key)) in unsettled {
      results.push((position, name, key, Err(NodeFailure::Panicked("task did not complete".to_string()))));
    }

    Ok(results)
  }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    s.to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic".to_string()
  }
}

/// Evaluate one node against the bundles of its dependencies.
///
/// Import nodes go through [`evaluate`]. Native libraries only wrap their
/// archives; their bundle is assembled from the declared context.
pub fn evaluate_node(
  spec: &NodeSpec,
  deps: &[Arc<MetadataBundle>],
  toolchain: &dyn Toolchain,
  config: &ToolchainConfig,
) -> Result<NodeOutcome, NodeFailure> {
  match spec {
    NodeSpec::Import(import) => {
      let evaluation = evaluate(&import.descriptor, deps, toolchain, config)?;
      Ok(NodeOutcome {
        bundle: Arc::new(evaluation.bundle),
        decision: Some(evaluation.decision),
        diagnostics: evaluation.diagnostics,
        cached: false,
      })
    }
    NodeSpec::Native(native) => {
      let libraries = native
        .archives
        .iter()
        .map(|archive| {
          toolchain
            .wrap_archive(archive, native.always_link, config)
            .map_err(|e| EvalError::new(&native.name, e))
        })
        .collect::<Result<Vec<LibraryDescriptor>, EvalError>>()?;
      let bundle = merge_native(&native.name, &native.context, &native.archives, &libraries, deps);
      debug!(node = %native.name, libraries = libraries.len(), "assembled native library");
      Ok(NodeOutcome {
        bundle: Arc::new(bundle),
        decision: None,
        diagnostics: Vec::new(),
        cached: false,
      })
    }
  }
}

/// What a run would do with one node, without calling the toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedNode {
  pub name: String,
  pub kind: &'static str,
  pub deps: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub decision: Option<PathDecision>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub diagnostics: Vec<Diagnostic>,
  /// Why the node cannot be evaluated, if it cannot.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

/// The waves of a graph and the path each import node would take.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphPlan {
  pub waves: Vec<Vec<PlannedNode>>,
}

impl GraphPlan {
  pub fn node_count(&self) -> usize {
    self.waves.iter().map(Vec::len).sum()
  }

  /// Nodes that would fail path selection.
  pub fn invalid_nodes(&self) -> impl Iterator<Item = &PlannedNode> {
    self.waves.iter().flatten().filter(|n| n.error.is_some())
  }

  pub fn is_valid(&self) -> bool {
    self.invalid_nodes().next().is_none()
  }
}

/// Compute the plan of `manifest`.
pub fn plan(manifest: &GraphManifest) -> Result<GraphPlan, GraphError> {
  let dag = GraphDag::from_manifest(manifest)?;

  let waves = dag
    .waves()?
    .into_iter()
    .map(|wave| {
      wave
        .into_iter()
        .map(|position| plan_node(&manifest.nodes[position]))
        .collect()
    })
    .collect();

  Ok(GraphPlan { waves })
}

fn plan_node(spec: &NodeSpec) -> PlannedNode {
  let mut planned = PlannedNode {
    name: spec.name().to_string(),
    kind: spec.kind(),
    deps: spec.deps().to_vec(),
    decision: None,
    diagnostics: Vec::new(),
    error: None,
  };

  if let NodeSpec::Import(import) = spec {
    match select_path(&import.descriptor) {
      Ok(selection) => {
        planned.decision = Some(selection.decision);
        planned.diagnostics = selection.diagnostics;
      }
      Err(e) => planned.error = Some(e.to_string()),
    }
  }

  planned
}
