use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;

use super::extend_unique;

/// Opaque handle returned by the native toolchain when wrapping an archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LibraryHandle(pub String);

impl std::fmt::Display for LibraryHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A linkable wrapper around one static archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibraryDescriptor {
  pub archive: Artifact,
  pub always_link: bool,
  pub handle: LibraryHandle,
}

/// The libraries contributed by a single node, grouped under its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkerInput {
  pub owner: String,
  pub libraries: Vec<LibraryDescriptor>,
}

impl LinkerInput {
  /// Group `libraries` under `owner`. Identical descriptors collapse to their
  /// first occurrence.
  pub fn new(owner: impl Into<String>, libraries: &[LibraryDescriptor]) -> Self {
    let mut unique = Vec::with_capacity(libraries.len());
    let mut seen = HashSet::new();
    extend_unique(&mut unique, &mut seen, libraries);

    Self {
      owner: owner.into(),
      libraries: unique,
    }
  }
}

/// Ordered linker inputs reachable from a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkingContext {
  pub linker_inputs: Vec<LinkerInput>,
}

impl LinkingContext {
  /// `own` at index 0, followed by every dependency's linker inputs in edge
  /// order. Inputs from different nodes are never deduplicated against each
  /// other.
  pub fn merge<'a>(own: LinkerInput, deps: impl IntoIterator<Item = &'a LinkingContext>) -> Self {
    let mut linker_inputs = vec![own];
    for dep in deps {
      linker_inputs.extend(dep.linker_inputs.iter().cloned());
    }
    Self { linker_inputs }
  }

  /// All library descriptors, in linker input order.
  pub fn libraries(&self) -> impl Iterator<Item = &LibraryDescriptor> {
    self.linker_inputs.iter().flat_map(|input| input.libraries.iter())
  }
}
