use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;

use super::extend_unique;

/// Header and include metadata a node exposes to its dependents.
///
/// The core never interprets these entries; it only merges them. Adapters
/// turn them into compiler flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationContext {
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub headers: Vec<Artifact>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub include_dirs: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub defines: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub module_maps: Vec<Artifact>,
}

impl CompilationContext {
  pub fn is_empty(&self) -> bool {
    self.headers.is_empty() && self.include_dirs.is_empty() && self.defines.is_empty() && self.module_maps.is_empty()
  }

  /// Union of `own` and `deps`, field by field.
  ///
  /// Order is preserved: `own` entries first, then each dependency in the
  /// given order. An entry seen earlier is not repeated.
  pub fn merge<'a>(own: &'a CompilationContext, deps: impl IntoIterator<Item = &'a CompilationContext>) -> Self {
    let mut merged = CompilationContext::default();
    let mut headers = HashSet::new();
    let mut include_dirs = HashSet::new();
    let mut defines = HashSet::new();
    let mut module_maps = HashSet::new();

    for ctx in std::iter::once(own).chain(deps) {
      extend_unique(&mut merged.headers, &mut headers, &ctx.headers);
      extend_unique(&mut merged.include_dirs, &mut include_dirs, &ctx.include_dirs);
      extend_unique(&mut merged.defines, &mut defines, &ctx.defines);
      extend_unique(&mut merged.module_maps, &mut module_maps, &ctx.module_maps);
    }

    merged
  }
}
