//! Metadata contexts exchanged between graph nodes.
//!
//! Each context is an immutable value produced by one node evaluation:
//! - `CompilationContext`: headers and include metadata for native interop
//! - `LinkingContext`: linker inputs grouped by owning node
//! - `ModuleContext` / `ModuleMetadataSet`: module identities and their artifacts
//! - `InteropMetadata`: platform-agnostic bundle for cross-ecosystem consumers

mod compilation;
mod interop;
mod linking;
mod module;

pub use compilation::CompilationContext;
pub use interop::InteropMetadata;
pub use linking::{LibraryDescriptor, LibraryHandle, LinkerInput, LinkingContext};
pub use module::{ModuleArtifacts, ModuleContext, ModuleMetadataSet};

use std::collections::HashSet;
use std::hash::Hash;

/// Append `items` to `out`, skipping anything already recorded in `seen`.
pub(crate) fn extend_unique<'a, T>(out: &mut Vec<T>, seen: &mut HashSet<T>, items: impl IntoIterator<Item = &'a T>)
where
  T: Clone + Eq + Hash + 'a,
{
  for item in items {
    if seen.insert(item.clone()) {
      out.push(item.clone());
    }
  }
}
