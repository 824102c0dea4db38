use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::consts::{DEFAULT_DOC_EXTENSION, DEFAULT_MODULE_EXTENSION};
use crate::util::hash::Hashable;

/// Toolchain configuration shared by every node of a graph.
///
/// Every field has a default, so `{}` is a valid configuration. Without a
/// `compiler` only nodes on the passthrough path can be evaluated.
///
/// # Argument templates
///
/// `compile_args` and `doc_args` may reference these placeholders:
/// - `{interface}`: the textual interface to compile
/// - `{module_name}`: the module name
/// - `{module_out}`: where the compiled module must be written
/// - `{doc_out}`: where the documentation must be written
///
/// `doc_args` is appended after `compile_args` only when `emit_doc` is set.
/// A `compile_args` entry that references `{doc_out}` is dropped when it is
/// not. Flags derived from dependency compilation contexts and dependency
/// modules come last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
  pub compiler: Option<String>,
  pub compile_args: Vec<String>,
  pub doc_args: Vec<String>,
  pub include_flag: String,
  pub define_flag: String,
  pub module_map_flag: String,
  pub module_search_flag: String,
  pub out_dir: String,
  pub module_extension: String,
  pub doc_extension: String,
  pub emit_doc: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub target: Option<String>,
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub env: BTreeMap<String, String>,
}

impl Default for ToolchainConfig {
  fn default() -> Self {
    Self {
      compiler: None,
      compile_args: [
        "-compile-module-from-interface",
        "{interface}",
        "-module-name",
        "{module_name}",
        "-o",
        "{module_out}",
      ]
      .iter()
      .map(|s| s.to_string())
      .collect(),
      doc_args: vec!["-emit-module-doc-path".to_string(), "{doc_out}".to_string()],
      include_flag: "-I".to_string(),
      define_flag: "-D".to_string(),
      module_map_flag: "-fmodule-map-file=".to_string(),
      module_search_flag: "-I".to_string(),
      out_dir: "out".to_string(),
      module_extension: DEFAULT_MODULE_EXTENSION.to_string(),
      doc_extension: DEFAULT_DOC_EXTENSION.to_string(),
      emit_doc: true,
      target: None,
      env: BTreeMap::new(),
    }
  }
}

impl ToolchainConfig {
  /// Where the compiled module for `name` is written.
  pub fn module_out(&self, name: &str) -> Artifact {
    self.out_path(name, &self.module_extension)
  }

  /// Where the documentation for `name` is written, if any.
  pub fn doc_out(&self, name: &str) -> Option<Artifact> {
    self.emit_doc.then(|| self.out_path(name, &self.doc_extension))
  }

  fn out_path(&self, name: &str, extension: &str) -> Artifact {
    let path = Path::new(&self.out_dir).join(format!("{}.{}", name, extension));
    Artifact::new(path.to_string_lossy())
  }
}

impl Hashable for ToolchainConfig {}
