//! Single-node evaluation.
//!
//! [`evaluate`] is the only entry point the host needs: it validates the
//! descriptor, picks a path, calls the toolchain where required and merges the
//! result with the dependency edges' bundles.
//!
//! Evaluation is synchronous and touches nothing but its inputs, so
//! independent nodes can be evaluated concurrently and the result memoized.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::artifact::{Artifact, ArtifactDescriptor};
use crate::context::{CompilationContext, LibraryDescriptor, ModuleArtifacts, ModuleContext};
use crate::merge::{MetadataBundle, OwnMetadata, dependency_compilation_context, merge_metadata};
use crate::select::{Diagnostic, PathDecision, SelectError, select_path};
use crate::toolchain::{CompilationError, CompileRequest, LinkError, Toolchain, ToolchainConfig};

/// Why a node could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalErrorKind {
  #[error(transparent)]
  Select(#[from] SelectError),

  #[error("compilation failed: {0}")]
  Compilation(#[from] CompilationError),

  #[error("failed to wrap archive: {0}")]
  Link(#[from] LinkError),
}

/// A fatal evaluation failure, tagged with the failing node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("module {module}: {kind}")]
pub struct EvalError {
  pub module: String,
  pub kind: EvalErrorKind,
}

impl EvalError {
  pub(crate) fn new(module: &str, kind: impl Into<EvalErrorKind>) -> Self {
    Self {
      module: module.to_string(),
      kind: kind.into(),
    }
  }
}

/// The result of evaluating one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
  pub bundle: MetadataBundle,
  pub decision: PathDecision,
  pub diagnostics: Vec<Diagnostic>,
}

/// Evaluate one import node against its dependency edges.
///
/// # Errors
///
/// - `Select(MissingArtifact)` if neither a module nor an interface is
///   declared; no toolchain call is made.
/// - `Compilation` if compiling the interface fails.
/// - `Link` if an archive cannot be wrapped.
///
/// No bundle is produced on failure.
pub fn evaluate(
  descriptor: &ArtifactDescriptor,
  deps: &[Arc<MetadataBundle>],
  toolchain: &dyn Toolchain,
  config: &ToolchainConfig,
) -> Result<Evaluation, EvalError> {
  let name = descriptor.name.as_str();

  let selection = select_path(descriptor).map_err(|e| EvalError::new(name, e))?;
  for diagnostic in &selection.diagnostics {
    warn!(module = %name, "{}", diagnostic);
  }
  debug!(module = %name, path = %selection.decision, deps = deps.len(), "selected path");

  let compilation_context = dependency_compilation_context(deps);

  let module = match selection.decision {
    PathDecision::Compile => compile(descriptor, deps, toolchain, config)?,
    PathDecision::Passthrough => passthrough(descriptor, &compilation_context)?,
  };

  let libraries = wrap_archives(descriptor, toolchain, config)?;

  let own = OwnMetadata {
    name: descriptor.name.clone(),
    archives: descriptor.archives.clone(),
    module,
    libraries,
    test_only: descriptor.test_only,
  };
  let bundle = merge_metadata(own, compilation_context, deps);

  info!(
    module = %name,
    path = %selection.decision,
    outputs = bundle.outputs.len(),
    modules = bundle.modules.len(),
    "evaluated module"
  );

  Ok(Evaluation {
    bundle,
    decision: selection.decision,
    diagnostics: selection.diagnostics,
  })
}

/// Compile the interface; the resulting module exposes no native headers.
fn compile(
  descriptor: &ArtifactDescriptor,
  deps: &[Arc<MetadataBundle>],
  toolchain: &dyn Toolchain,
  config: &ToolchainConfig,
) -> Result<ModuleContext, EvalError> {
  let name = descriptor.name.as_str();
  let Some(interface) = descriptor.interface_file.as_ref() else {
    return Err(EvalError::new(name, SelectError::MissingArtifact));
  };

  let request = CompileRequest {
    interface,
    module_name: name,
    dependency_compilation_contexts: deps.iter().map(|dep| &dep.native.compilation_context).collect(),
    dependency_modules: deps.iter().flat_map(|dep| dep.modules.iter()).collect(),
  };

  let artifacts = toolchain
    .compile_module_interface(&request, config)
    .map_err(|e| EvalError::new(name, e))?;
  debug!(module = %name, module_file = %artifacts.module_file, "compiled module interface");

  Ok(ModuleContext {
    name: descriptor.name.clone(),
    compilation_context: None,
    artifacts: Some(artifacts),
  })
}

/// Use the declared module; its interop headers come from the dependencies.
fn passthrough(
  descriptor: &ArtifactDescriptor,
  compilation_context: &CompilationContext,
) -> Result<ModuleContext, EvalError> {
  let Some(module_file) = descriptor.module_file.clone() else {
    return Err(EvalError::new(&descriptor.name, SelectError::MissingArtifact));
  };

  Ok(ModuleContext {
    name: descriptor.name.clone(),
    compilation_context: Some(compilation_context.clone()),
    artifacts: Some(ModuleArtifacts {
      module_file,
      doc_file: descriptor.doc_file.clone(),
    }),
  })
}

/// One library per archive, in archive order.
fn wrap_archives(
  descriptor: &ArtifactDescriptor,
  toolchain: &dyn Toolchain,
  config: &ToolchainConfig,
) -> Result<Vec<LibraryDescriptor>, EvalError> {
  descriptor
    .archives
    .iter()
    .map(|archive: &Artifact| {
      toolchain
        .wrap_archive(archive, descriptor.always_link, config)
        .map_err(|e| EvalError::new(&descriptor.name, e))
    })
    .collect()
}
