//! Test utilities for modlink-lib.
//!
//! `RecordingToolchain` stands in for a real toolchain: it records every call
//! and returns predictable artifacts, or a configured error.

use std::sync::Mutex;

use crate::artifact::Artifact;
use crate::context::{CompilationContext, LibraryDescriptor, LibraryHandle, ModuleArtifacts};
use crate::toolchain::{CompilationError, CompileRequest, LinkError, Toolchain, ToolchainConfig};

/// A call observed by `RecordingToolchain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolchainCall {
  Compile {
    module_name: String,
    interface: Artifact,
    contexts: Vec<CompilationContext>,
    modules: Vec<String>,
  },
  Wrap {
    archive: Artifact,
    always_link: bool,
  },
}

#[derive(Debug, Default)]
pub struct RecordingToolchain {
  calls: Mutex<Vec<ToolchainCall>>,
  compile_error: Option<CompilationError>,
  wrap_error: Option<LinkError>,
}

impl RecordingToolchain {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn failing_compile(error: CompilationError) -> Self {
    Self {
      compile_error: Some(error),
      ..Self::default()
    }
  }

  pub fn failing_wrap(error: LinkError) -> Self {
    Self {
      wrap_error: Some(error),
      ..Self::default()
    }
  }

  pub fn calls(&self) -> Vec<ToolchainCall> {
    self.calls.lock().unwrap().clone()
  }

  pub fn compile_calls(&self) -> Vec<ToolchainCall> {
    self
      .calls()
      .into_iter()
      .filter(|c| matches!(c, ToolchainCall::Compile { .. }))
      .collect()
  }

  pub fn wrap_calls(&self) -> Vec<ToolchainCall> {
    self
      .calls()
      .into_iter()
      .filter(|c| matches!(c, ToolchainCall::Wrap { .. }))
      .collect()
  }
}

impl Toolchain for RecordingToolchain {
  fn compile_module_interface(
    &self,
    request: &CompileRequest<'_>,
    config: &ToolchainConfig,
  ) -> Result<ModuleArtifacts, CompilationError> {
    self.calls.lock().unwrap().push(ToolchainCall::Compile {
      module_name: request.module_name.to_string(),
      interface: request.interface.clone(),
      contexts: request.dependency_compilation_contexts.iter().map(|c| (*c).clone()).collect(),
      modules: request.dependency_modules.iter().map(|m| m.name.clone()).collect(),
    });

    if let Some(error) = &self.compile_error {
      return Err(error.clone());
    }

    Ok(ModuleArtifacts {
      module_file: config.module_out(request.module_name),
      doc_file: config.doc_out(request.module_name),
    })
  }

  fn wrap_archive(
    &self,
    archive: &Artifact,
    always_link: bool,
    _config: &ToolchainConfig,
  ) -> Result<LibraryDescriptor, LinkError> {
    self.calls.lock().unwrap().push(ToolchainCall::Wrap {
      archive: archive.clone(),
      always_link,
    });

    if let Some(error) = &self.wrap_error {
      return Err(error.clone());
    }

    Ok(LibraryDescriptor {
      archive: archive.clone(),
      always_link,
      handle: LibraryHandle(format!("lib:{}", archive)),
    })
  }
}
