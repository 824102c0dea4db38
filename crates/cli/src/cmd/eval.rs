//! Implementation of the `modlink eval` command.
//!
//! This command loads a graph manifest, evaluates every node against the
//! command toolchain and reports each node's outcome.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use serde_json::json;
use tracing::info;

use modlink_lib::graph::{GraphManifest, GraphResult, GraphRunner, NodeOutcome, RunConfig};
use modlink_lib::toolchain::CommandToolchain;

use crate::output::{ARROW, OutputFormat, Status, format_duration, print_json, print_stat, print_status, truncate_hash};

/// Execute the eval command.
///
/// Fails if the manifest cannot be loaded, or if any node failed or was
/// skipped after every independent node has been evaluated.
pub fn cmd_eval(file: &Path, parallelism: Option<usize>, verbose: bool, output: OutputFormat) -> Result<()> {
  let manifest =
    GraphManifest::from_path(file).with_context(|| format!("Failed to load graph: {}", file.display()))?;

  let config = RunConfig {
    parallelism: parallelism.unwrap_or_else(|| RunConfig::default().parallelism),
  };
  let mut runner = GraphRunner::new(Arc::new(CommandToolchain::new()), config);

  let started = Instant::now();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let result = rt
    .block_on(runner.run(&manifest))
    .with_context(|| format!("Failed to evaluate graph: {}", file.display()))?;
  let elapsed = started.elapsed();

  info!(nodes = result.total(), elapsed_ms = elapsed.as_millis() as u64, "graph evaluated");

  if output.is_json() {
    print_json(&result_json(&result))?;
  } else {
    print_text(&result, verbose);
    println!();
    print_status(
      Status::Info,
      &format!(
        "{} evaluated, {} failed, {} skipped in {}",
        result.evaluated.len(),
        result.failed.len(),
        result.skipped.len(),
        format_duration(elapsed)
      ),
    );
  }

  if !result.is_success() {
    bail!(
      "{} node(s) failed and {} node(s) were skipped",
      result.failed.len(),
      result.skipped.len()
    );
  }

  Ok(())
}

fn print_text(result: &GraphResult, verbose: bool) {
  for name in &result.order {
    if let Some(outcome) = result.evaluated.get(name) {
      print_status(Status::Evaluated, &format!("{} {}", name, describe(outcome)));
      for diagnostic in &outcome.diagnostics {
        print_status(Status::Warning, &diagnostic.to_string());
      }
      if verbose {
        print_details(outcome);
      }
    } else if let Some(failure) = result.failed.get(name) {
      print_status(Status::Failed, &format!("{}: {}", name, failure));
    } else if let Some(dep) = result.skipped.get(name) {
      print_status(Status::Skipped, &format!("{} skipped: {}", name, dep));
    }
  }
}

fn describe(outcome: &NodeOutcome) -> String {
  let path = outcome
    .decision
    .map(|d| d.to_string())
    .unwrap_or_else(|| "native".to_string());
  if outcome.cached {
    format!("({}, cached)", path)
  } else {
    format!("({})", path)
  }
}

fn print_details(outcome: &NodeOutcome) {
  let bundle = &outcome.bundle;
  for file in &bundle.outputs {
    println!("    {} {}", ARROW, file);
  }
  print_stat("Modules", &bundle.modules.names().join(", "));
  let libraries: Vec<String> = bundle
    .native
    .linking_context
    .libraries()
    .map(|lib| format!("{} [{}]", lib.archive, truncate_hash(&lib.handle.0)))
    .collect();
  if !libraries.is_empty() {
    print_stat("Libraries", &libraries.join(", "));
  }
  let include_dirs = &bundle.native.compilation_context.include_dirs;
  if !include_dirs.is_empty() {
    print_stat("Include dirs", &include_dirs.join(", "));
  }
}

fn result_json(result: &GraphResult) -> serde_json::Value {
  let evaluated: serde_json::Map<String, serde_json::Value> = result
    .evaluated
    .iter()
    .map(|(name, outcome)| {
      (
        name.clone(),
        json!({
          "decision": outcome.decision,
          "cached": outcome.cached,
          "diagnostics": outcome.diagnostics,
          "bundle": outcome.bundle.as_ref(),
        }),
      )
    })
    .collect();
  let failed: serde_json::Map<String, serde_json::Value> = result
    .failed
    .iter()
    .map(|(name, failure)| (name.clone(), json!(failure.to_string())))
    .collect();
  let skipped: serde_json::Map<String, serde_json::Value> = result
    .skipped
    .iter()
    .map(|(name, dep)| (name.clone(), json!({ "failed_dependency": dep.0 })))
    .collect();

  json!({
    "success": result.is_success(),
    "order": result.order,
    "evaluated": evaluated,
    "failed": failed,
    "skipped": skipped,
    "diagnostics": result.diagnostics().map(|d| d.to_string()).collect::<Vec<_>>(),
  })
}
