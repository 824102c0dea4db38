//! Tests for whole-graph runs.

use std::sync::Arc;

use modlink_lib::artifact::Artifact;
use modlink_lib::graph::{FailedDependency, GraphManifest, GraphRunner, NodeFailure, RunConfig, plan};
use modlink_lib::select::PathDecision;

use super::common::{CountingToolchain, from_interface, manifest, native, prebuilt};

/// Zlib <- Bar, Zlib <- Baz, {Bar, Baz} <- App
fn diamond() -> GraphManifest {
  manifest(vec![
    prebuilt("App", &["Bar", "Baz"]),
    prebuilt("Bar", &["Zlib"]),
    from_interface("Baz", &["Zlib"]),
    native("Zlib", "zlib/include", &[]),
  ])
}

#[tokio::test]
async fn diamond_composes_metadata() {
  let toolchain = Arc::new(CountingToolchain::default());
  let mut runner = GraphRunner::new(toolchain.clone(), RunConfig::default());

  let result = runner.run(&diamond()).await.unwrap();

  assert!(result.is_success());
  assert_eq!(result.order, vec!["Zlib", "Bar", "Baz", "App"]);

  let app = result.bundle("App").unwrap();
  assert_eq!(app.modules.names(), vec!["App", "Bar", "Baz"]);
  assert_eq!(app.native.compilation_context.include_dirs, vec!["zlib/include"]);

  let owners: Vec<&str> = app
    .native
    .linking_context
    .linker_inputs
    .iter()
    .map(|i| i.owner.as_str())
    .collect();
  assert_eq!(owners, vec!["App", "Bar", "Zlib", "Baz", "Zlib"]);

  let interop = app.interop.as_ref().unwrap();
  let archives: Vec<&str> = interop.libraries.iter().map(|l| l.archive.0.as_str()).collect();
  assert_eq!(archives, vec!["libApp.a", "libBar.a", "libZlib.a"]);
  assert_eq!(interop.direct_libraries.len(), 1);

  let own_module = app.modules.first().unwrap();
  assert_eq!(
    own_module.compilation_context.as_ref().map(|c| c.include_dirs.clone()),
    Some(vec!["zlib/include".to_string()])
  );

  assert_eq!(result.evaluated["Baz"].decision, Some(PathDecision::Compile));
  assert_eq!(toolchain.compiled(), vec!["Baz"]);
}

#[tokio::test]
async fn repeated_runs_call_the_toolchain_once() {
  let toolchain = Arc::new(CountingToolchain::default());
  let mut runner = GraphRunner::new(toolchain.clone(), RunConfig::default());
  let graph = diamond();

  runner.run(&graph).await.unwrap();
  let wrapped = toolchain.wrapped().len();
  let again = runner.run(&graph).await.unwrap();

  assert!(again.is_success());
  assert!(again.evaluated.values().all(|o| o.cached));
  assert_eq!(toolchain.compiled(), vec!["Baz"]);
  assert_eq!(toolchain.wrapped().len(), wrapped);
}

#[tokio::test]
async fn compile_failure_skips_dependents_only() {
  let toolchain = Arc::new(CountingToolchain::with_broken(&["Baz"]));
  let mut runner = GraphRunner::new(toolchain, RunConfig::default());

  let result = runner.run(&diamond()).await.unwrap();

  assert!(!result.is_success());
  assert!(result.evaluated.contains_key("Zlib"));
  assert!(result.evaluated.contains_key("Bar"));
  assert_eq!(result.skipped["App"], FailedDependency("Baz".to_string()));

  let NodeFailure::Eval(err) = &result.failed["Baz"] else {
    panic!("expected an evaluation failure");
  };
  assert_eq!(err.module, "Baz");
  assert!(err.to_string().contains("cannot compile Baz"));
}

#[tokio::test]
async fn single_permit_evaluates_wide_waves() {
  let toolchain = Arc::new(CountingToolchain::default());
  let mut runner = GraphRunner::new(toolchain.clone(), RunConfig { parallelism: 1 });
  let nodes = (0..8).map(|i| from_interface(&format!("M{}", i), &[])).collect();

  let result = runner.run(&manifest(nodes)).await.unwrap();

  assert_eq!(result.evaluated.len(), 8);
  assert_eq!(toolchain.compiled().len(), 8);
  assert_eq!(result.order.first().map(String::as_str), Some("M0"));
}

#[tokio::test]
async fn runs_manifest_from_json() {
  let graph = GraphManifest::from_json(
    r#"{
      "toolchain": { "out_dir": "build", "emit_doc": false },
      "nodes": [
        { "kind": "native", "name": "Zlib", "include_dirs": ["zlib/include"], "archives": ["libz.a"] },
        { "kind": "import", "name": "Foo", "interface_file": "Foo.swiftinterface", "deps": ["Zlib"] }
      ]
    }"#,
  )
  .unwrap();
  let mut runner = GraphRunner::new(Arc::new(CountingToolchain::default()), RunConfig::default());

  let result = runner.run(&graph).await.unwrap();

  let foo = result.bundle("Foo").unwrap();
  assert_eq!(foo.outputs, vec![Artifact::new("build/Foo.swiftmodule")]);
  assert_eq!(foo.native.linking_context.libraries().count(), 1);
}

#[test]
fn plan_matches_run_decisions() {
  let p = plan(&diamond()).unwrap();

  let names: Vec<Vec<&str>> = p
    .waves
    .iter()
    .map(|w| w.iter().map(|n| n.name.as_str()).collect())
    .collect();
  assert_eq!(names, vec![vec!["Zlib"], vec!["Bar", "Baz"], vec!["App"]]);
  assert_eq!(p.waves[1][1].decision, Some(PathDecision::Compile));
  assert!(p.is_valid());
}
