//! End-to-end runs against the command toolchain.

#![cfg(unix)]

use std::sync::Arc;

use modlink_lib::graph::{GraphRunner, RunConfig};
use modlink_lib::toolchain::{CommandToolchain, ToolchainConfig};
use tempfile::TempDir;

use super::common::{from_interface, manifest, native};

/// A "compiler" that writes the module and records the flags it was given.
fn shell_toolchain(out_dir: &TempDir) -> ToolchainConfig {
  ToolchainConfig {
    compiler: Some("/bin/sh".to_string()),
    compile_args: vec![
      "-c".to_string(),
      "out=\"$1\"; shift; echo \"$@\" > \"$out\"".to_string(),
      "sh".to_string(),
      "{module_out}".to_string(),
    ],
    out_dir: out_dir.path().to_string_lossy().to_string(),
    emit_doc: false,
    ..Default::default()
  }
}

#[tokio::test]
async fn compiled_module_sees_dependency_flags() {
  let temp = TempDir::new().unwrap();
  let mut graph = manifest(vec![
    native("Zlib", "zlib/include", &[]),
    from_interface("Foo", &["Zlib"]),
  ]);
  graph.toolchain = shell_toolchain(&temp);

  let mut runner = GraphRunner::new(Arc::new(CommandToolchain::new()), RunConfig::default());
  let result = runner.run(&graph).await.unwrap();

  assert!(result.is_success(), "failures: {:?}", result.failed);
  let foo = result.bundle("Foo").unwrap();
  let module_file = foo.modules.first().unwrap().module_file().unwrap();
  let written = std::fs::read_to_string(module_file.path()).unwrap();
  assert_eq!(written.trim(), "-Izlib/include");
  // No documentation was produced, so none is listed
  assert_eq!(foo.outputs, vec![module_file.clone()]);
}

#[tokio::test]
async fn failing_compiler_fails_node() {
  let temp = TempDir::new().unwrap();
  let mut graph = manifest(vec![from_interface("Foo", &[])]);
  graph.toolchain = ToolchainConfig {
    compile_args: vec!["-c".to_string(), "echo nope >&2; exit 1".to_string()],
    ..shell_toolchain(&temp)
  };

  let mut runner = GraphRunner::new(Arc::new(CommandToolchain::new()), RunConfig::default());
  let result = runner.run(&graph).await.unwrap();

  assert!(result.failed["Foo"].to_string().contains("nope"));
}
