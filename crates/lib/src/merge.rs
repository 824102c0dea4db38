//! Metadata composition.
//!
//! A node's bundle is assembled from its own contribution and the finalized
//! bundles of its dependency edges. Four domains are merged independently:
//! - default outputs: files the host lists for the node
//! - native metadata: compilation and linking contexts
//! - interop metadata: libraries and module for cross-ecosystem consumers
//! - modules: every module context reachable from the node
//!
//! Merging performs no I/O and cannot fail.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::context::{
  CompilationContext, InteropMetadata, LibraryDescriptor, LinkerInput, LinkingContext, ModuleContext,
  ModuleMetadataSet, extend_unique,
};
use crate::util::hash::Hashable;

/// Compilation and linking metadata for native (C/C++) consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeMetadata {
  pub compilation_context: CompilationContext,
  pub linking_context: LinkingContext,
}

/// What a node exposes to its dependents and to the host.
///
/// Bundles are immutable once produced; dependents hold them behind an `Arc`
/// and only read from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataBundle {
  /// Default output files, archives first.
  pub outputs: Vec<Artifact>,
  pub native: NativeMetadata,
  /// Present for every import node; absent for pre-resolved native libraries.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub interop: Option<InteropMetadata>,
  pub modules: ModuleMetadataSet,
}

impl Hashable for MetadataBundle {}

impl MetadataBundle {
  /// Library groups this bundle contributes to a dependent's interop set.
  fn interop_libraries(&self) -> Vec<&[LibraryDescriptor]> {
    match &self.interop {
      Some(interop) => vec![interop.libraries.as_slice()],
      None => self
        .native
        .linking_context
        .linker_inputs
        .iter()
        .map(|input| input.libraries.as_slice())
        .collect(),
    }
  }
}

/// The parts of a bundle that come from the evaluated node itself.
#[derive(Debug, Clone)]
pub struct OwnMetadata {
  pub name: String,
  pub archives: Vec<Artifact>,
  pub module: ModuleContext,
  /// One descriptor per archive, in archive order.
  pub libraries: Vec<LibraryDescriptor>,
  pub test_only: bool,
}

/// Union of the dependency edges' compilation contexts, in edge order.
///
/// An import node contributes no headers of its own, so this is also the
/// node's merged compilation context.
pub fn dependency_compilation_context(deps: &[Arc<MetadataBundle>]) -> CompilationContext {
  CompilationContext::merge(
    &CompilationContext::default(),
    deps.iter().map(|dep| &dep.native.compilation_context),
  )
}

/// Assemble an import node's bundle.
///
/// `compilation_context` is the node's merged compilation context, normally
/// [`dependency_compilation_context`] of `deps`.
pub fn merge_metadata(
  own: OwnMetadata,
  compilation_context: CompilationContext,
  deps: &[Arc<MetadataBundle>],
) -> MetadataBundle {
  let module_artifacts = own
    .module
    .artifacts
    .iter()
    .flat_map(|a| std::iter::once(&a.module_file).chain(a.doc_file.as_ref()));
  let outputs = unique_outputs(own.archives.iter().chain(module_artifacts));

  let linking_context = LinkingContext::merge(
    LinkerInput::new(own.name.as_str(), &own.libraries),
    deps.iter().map(|dep| &dep.native.linking_context),
  );

  let modules = ModuleMetadataSet::merge(own.module.clone(), deps.iter().map(|dep| &dep.modules));

  let interop = InteropMetadata::new(
    own.module,
    own.libraries,
    deps.iter().flat_map(|dep| dep.interop_libraries()),
    own.test_only,
  );

  MetadataBundle {
    outputs,
    native: NativeMetadata {
      compilation_context,
      linking_context,
    },
    interop: Some(interop),
    modules,
  }
}

/// Assemble the bundle of a pre-resolved native library.
///
/// Native libraries expose their own compilation context ahead of their
/// dependencies' and link like import nodes, but carry no module and no
/// interop metadata.
pub fn merge_native(
  name: &str,
  own_context: &CompilationContext,
  archives: &[Artifact],
  libraries: &[LibraryDescriptor],
  deps: &[Arc<MetadataBundle>],
) -> MetadataBundle {
  let compilation_context =
    CompilationContext::merge(own_context, deps.iter().map(|dep| &dep.native.compilation_context));
  let linking_context = LinkingContext::merge(
    LinkerInput::new(name, libraries),
    deps.iter().map(|dep| &dep.native.linking_context),
  );

  MetadataBundle {
    outputs: unique_outputs(archives),
    native: NativeMetadata {
      compilation_context,
      linking_context,
    },
    interop: None,
    modules: ModuleMetadataSet::default(),
  }
}

fn unique_outputs<'a>(files: impl IntoIterator<Item = &'a Artifact>) -> Vec<Artifact> {
  let mut outputs = Vec::new();
  let mut seen = HashSet::new();
  extend_unique(&mut outputs, &mut seen, files);
  outputs
}
