//! Toolchain adapters.
//!
//! The evaluator never produces artifacts itself. It asks a [`Toolchain`] to
//! compile a textual module interface or to wrap an archive into a linkable
//! library, and treats both as opaque synchronous calls.

mod command;
mod config;

pub use command::CommandToolchain;
pub use config::ToolchainConfig;

use thiserror::Error;

use crate::artifact::Artifact;
use crate::context::{CompilationContext, LibraryDescriptor, ModuleArtifacts, ModuleContext};

/// Everything a toolchain needs to compile one module interface.
#[derive(Debug, Clone)]
pub struct CompileRequest<'a> {
  pub interface: &'a Artifact,
  pub module_name: &'a str,
  /// Compilation contexts of the dependency edges, in edge order.
  pub dependency_compilation_contexts: Vec<&'a CompilationContext>,
  /// Modules reachable through the dependency edges, in edge order.
  pub dependency_modules: Vec<&'a ModuleContext>,
}

/// Errors raised while compiling a module interface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompilationError {
  #[error("no compiler configured")]
  NotConfigured,

  #[error("failed to run {program}: {message}")]
  Spawn { program: String, message: String },

  #[error("compiler exited with code {code:?}: {stderr}")]
  CommandFailed { code: Option<i32>, stderr: String },

  #[error("compiler did not produce {0}")]
  MissingOutput(Artifact),

  #[error("failed to remove stale output {path}: {message}")]
  StaleOutput { path: Artifact, message: String },

  #[error("{0}")]
  Other(String),
}

/// Errors raised while wrapping an archive into a library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
  #[error("{0} is not a static archive")]
  NotAnArchive(Artifact),

  #[error("failed to compute library handle for {archive}: {message}")]
  Handle { archive: Artifact, message: String },

  #[error("{0}")]
  Other(String),
}

/// External services used by the evaluator.
///
/// Implementations must be shareable across threads: the graph driver
/// evaluates independent nodes concurrently against one toolchain.
pub trait Toolchain: Send + Sync {
  /// Compile `request.interface` into a binary module.
  fn compile_module_interface(
    &self,
    request: &CompileRequest<'_>,
    config: &ToolchainConfig,
  ) -> Result<ModuleArtifacts, CompilationError>;

  /// Wrap a static archive into a linkable library descriptor.
  fn wrap_archive(
    &self,
    archive: &Artifact,
    always_link: bool,
    config: &ToolchainConfig,
  ) -> Result<LibraryDescriptor, LinkError>;
}
