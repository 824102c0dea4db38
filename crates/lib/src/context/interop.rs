use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{LibraryDescriptor, ModuleContext, extend_unique};

/// Cross-ecosystem view of an import node.
///
/// Produced for every import node whether or not the target platform has a
/// consumer for it; consumers that don't need it ignore it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteropMetadata {
  pub module: ModuleContext,
  /// Libraries declared by this node.
  pub direct_libraries: Vec<LibraryDescriptor>,
  /// Libraries owned by this node and everything it depends on.
  pub libraries: Vec<LibraryDescriptor>,
  pub test_only: bool,
}

impl InteropMetadata {
  /// `direct` first, then each dependency's libraries in edge order, as a set.
  pub fn new<'a>(
    module: ModuleContext,
    direct: Vec<LibraryDescriptor>,
    deps: impl IntoIterator<Item = &'a [LibraryDescriptor]>,
    test_only: bool,
  ) -> Self {
    let mut libraries = Vec::with_capacity(direct.len());
    let mut seen = HashSet::new();
    extend_unique(&mut libraries, &mut seen, &direct);
    for dep in deps {
      extend_unique(&mut libraries, &mut seen, dep);
    }

    Self {
      module,
      direct_libraries: direct,
      libraries,
      test_only,
    }
  }
}
