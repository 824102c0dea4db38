use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;

use super::CompilationContext;

/// Compiled artifacts of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleArtifacts {
  pub module_file: Artifact,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub doc_file: Option<Artifact>,
}

/// A module identity plus what is needed to import it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleContext {
  pub name: String,
  /// Native headers to expose alongside the module, for interop.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub compilation_context: Option<CompilationContext>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub artifacts: Option<ModuleArtifacts>,
}

impl ModuleContext {
  pub fn module_file(&self) -> Option<&Artifact> {
    self.artifacts.as_ref().map(|a| &a.module_file)
  }
}

/// Every module reachable from a node, this node's own module first.
///
/// Entries are not deduplicated by name: a module reached through two edges
/// appears twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleMetadataSet(Vec<ModuleContext>);

impl ModuleMetadataSet {
  pub fn merge<'a>(own: ModuleContext, deps: impl IntoIterator<Item = &'a ModuleMetadataSet>) -> Self {
    let mut modules = vec![own];
    for dep in deps {
      modules.extend(dep.0.iter().cloned());
    }
    Self(modules)
  }

  pub fn first(&self) -> Option<&ModuleContext> {
    self.0.first()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &ModuleContext> {
    self.0.iter()
  }

  pub fn names(&self) -> Vec<&str> {
    self.0.iter().map(|m| m.name.as_str()).collect()
  }
}
