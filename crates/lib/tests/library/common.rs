//! Shared helpers for library integration tests.

use std::sync::Mutex;

use modlink_lib::artifact::{Artifact, ArtifactDescriptor};
use modlink_lib::context::{CompilationContext, LibraryDescriptor, LibraryHandle, ModuleArtifacts};
use modlink_lib::graph::{GraphManifest, ImportSpec, NativeLibrarySpec, NodeSpec};
use modlink_lib::toolchain::{CompilationError, CompileRequest, LinkError, Toolchain, ToolchainConfig};

/// A toolchain that counts calls and fabricates outputs without touching disk.
#[derive(Default)]
pub struct CountingToolchain {
  compiled: Mutex<Vec<String>>,
  wrapped: Mutex<Vec<String>>,
  /// Module names whose compilation fails.
  pub broken: Vec<String>,
}

impl CountingToolchain {
  pub fn with_broken(names: &[&str]) -> Self {
    Self {
      broken: names.iter().map(|n| n.to_string()).collect(),
      ..Default::default()
    }
  }

  pub fn compiled(&self) -> Vec<String> {
    self.compiled.lock().unwrap().clone()
  }

  pub fn wrapped(&self) -> Vec<String> {
    self.wrapped.lock().unwrap().clone()
  }
}

impl Toolchain for CountingToolchain {
  fn compile_module_interface(
    &self,
    request: &CompileRequest<'_>,
    config: &ToolchainConfig,
  ) -> Result<ModuleArtifacts, CompilationError> {
    self.compiled.lock().unwrap().push(request.module_name.to_string());
    if self.broken.iter().any(|b| b == request.module_name) {
      return Err(CompilationError::CommandFailed {
        code: Some(1),
        stderr: format!("cannot compile {}", request.module_name),
      });
    }
    Ok(ModuleArtifacts {
      module_file: config.module_out(request.module_name),
      doc_file: None,
    })
  }

  fn wrap_archive(
    &self,
    archive: &Artifact,
    always_link: bool,
    _config: &ToolchainConfig,
  ) -> Result<LibraryDescriptor, LinkError> {
    self.wrapped.lock().unwrap().push(archive.to_string());
    Ok(LibraryDescriptor {
      archive: archive.clone(),
      always_link,
      handle: LibraryHandle(format!("handle:{}", archive)),
    })
  }
}

pub fn prebuilt(name: &str, deps: &[&str]) -> NodeSpec {
  NodeSpec::Import(ImportSpec {
    descriptor: ArtifactDescriptor::new(name)
      .with_archive(format!("lib{}.a", name).as_str())
      .with_module(format!("{}.swiftmodule", name).as_str()),
    deps: deps.iter().map(|d| d.to_string()).collect(),
  })
}

pub fn from_interface(name: &str, deps: &[&str]) -> NodeSpec {
  NodeSpec::Import(ImportSpec {
    descriptor: ArtifactDescriptor::new(name).with_interface(format!("{}.swiftinterface", name).as_str()),
    deps: deps.iter().map(|d| d.to_string()).collect(),
  })
}

pub fn native(name: &str, include_dir: &str, deps: &[&str]) -> NodeSpec {
  NodeSpec::Native(NativeLibrarySpec {
    name: name.to_string(),
    context: CompilationContext {
      include_dirs: vec![include_dir.to_string()],
      ..Default::default()
    },
    archives: vec![Artifact::new(format!("lib{}.a", name))],
    always_link: false,
    deps: deps.iter().map(|d| d.to_string()).collect(),
  })
}

pub fn manifest(nodes: Vec<NodeSpec>) -> GraphManifest {
  GraphManifest {
    nodes,
    ..Default::default()
  }
}
