use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::util::hash::Hashable;

/// A file known to the build graph, identified by its path.
///
/// Artifacts compare structurally: two artifacts with the same path are the
/// same artifact, whoever created them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Artifact(pub String);

impl Artifact {
  pub fn new(path: impl Into<String>) -> Self {
    Self(path.into())
  }

  pub fn path(&self) -> &Path {
    Path::new(&self.0)
  }

  /// Final path component, or the whole path if it has none.
  pub fn file_name(&self) -> &str {
    self.path().file_name().and_then(|n| n.to_str()).unwrap_or(&self.0)
  }

  /// Parent directory as a string, if the path has one.
  pub fn dir(&self) -> Option<String> {
    self
      .path()
      .parent()
      .filter(|p| !p.as_os_str().is_empty())
      .map(|p| p.to_string_lossy().to_string())
  }
}

impl std::fmt::Display for Artifact {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<&str> for Artifact {
  fn from(path: &str) -> Self {
    Artifact::new(path)
  }
}

/// Files and flags declared by one import node.
///
/// At least one of `module_file` and `interface_file` must be set for the
/// descriptor to evaluate. When both are set the interface is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
  /// Module name; also the node's identity in the graph.
  pub name: String,
  /// Static archives, in link order.
  #[serde(default)]
  pub archives: Vec<Artifact>,
  /// Precompiled binary module.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub module_file: Option<Artifact>,
  /// Documentation artifact accompanying the module.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub doc_file: Option<Artifact>,
  /// Textual module interface to compile when no module is given.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub interface_file: Option<Artifact>,
  #[serde(default)]
  pub always_link: bool,
  #[serde(default)]
  pub test_only: bool,
}

impl ArtifactDescriptor {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      archives: Vec::new(),
      module_file: None,
      doc_file: None,
      interface_file: None,
      always_link: false,
      test_only: false,
    }
  }

  pub fn with_archive(mut self, archive: impl Into<Artifact>) -> Self {
    self.archives.push(archive.into());
    self
  }

  pub fn with_module(mut self, module: impl Into<Artifact>) -> Self {
    self.module_file = Some(module.into());
    self
  }

  pub fn with_doc(mut self, doc: impl Into<Artifact>) -> Self {
    self.doc_file = Some(doc.into());
    self
  }

  pub fn with_interface(mut self, interface: impl Into<Artifact>) -> Self {
    self.interface_file = Some(interface.into());
    self
  }

  pub fn with_always_link(mut self, always_link: bool) -> Self {
    self.always_link = always_link;
    self
  }

  pub fn with_test_only(mut self, test_only: bool) -> Self {
    self.test_only = test_only;
    self
  }
}

impl Hashable for ArtifactDescriptor {}
