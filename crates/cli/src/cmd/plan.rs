//! Implementation of the `modlink plan` command.
//!
//! This command validates a graph manifest and shows the evaluation waves and
//! the path each import node would take. No toolchain is invoked.

use std::path::Path;

use anyhow::{Context, Result, bail};

use modlink_lib::graph::{GraphManifest, plan};

use crate::output::{OutputFormat, Status, print_json, print_stat, print_status};

pub fn cmd_plan(file: &Path, output: OutputFormat) -> Result<()> {
  let manifest =
    GraphManifest::from_path(file).with_context(|| format!("Failed to load graph: {}", file.display()))?;

  let plan = plan(&manifest).with_context(|| format!("Invalid graph: {}", file.display()))?;

  if output.is_json() {
    print_json(&plan)?;
  } else {
    print_status(
      Status::Info,
      &format!("{} node(s) in {} wave(s)", plan.node_count(), plan.waves.len()),
    );
    for (idx, wave) in plan.waves.iter().enumerate() {
      println!();
      println!("Wave {}:", idx + 1);
      for node in wave {
        let path = node
          .decision
          .map(|d| d.to_string())
          .unwrap_or_else(|| node.kind.to_string());
        println!("  {} {} ({})", Status::Info.marker(), node.name, path);
        if !node.deps.is_empty() {
          print_stat("  Depends on", &node.deps.join(", "));
        }
        for diagnostic in &node.diagnostics {
          print_status(Status::Warning, &diagnostic.to_string());
        }
        if let Some(error) = &node.error {
          print_status(Status::Failed, &format!("{}: {}", node.name, error));
        }
      }
    }
  }

  let invalid: Vec<&str> = plan.invalid_nodes().map(|n| n.name.as_str()).collect();
  if !invalid.is_empty() {
    bail!("{} node(s) cannot be evaluated: {}", invalid.len(), invalid.join(", "));
  }

  Ok(())
}
