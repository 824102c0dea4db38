//! Path selection for import nodes.
//!
//! A node either passes a precompiled module through or compiles its textual
//! interface. The decision is a pure function of the descriptor.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::artifact::{Artifact, ArtifactDescriptor};

/// How an import node obtains its module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathDecision {
  /// Use the declared module file as is.
  Passthrough,
  /// Compile the declared interface file.
  Compile,
}

impl std::fmt::Display for PathDecision {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      PathDecision::Passthrough => write!(f, "passthrough"),
      PathDecision::Compile => write!(f, "compile"),
    }
  }
}

/// Non-fatal findings raised while evaluating a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
  /// Both a module and an interface were declared; the interface was not used.
  InterfaceIgnored { module: String, interface: Artifact },
}

impl std::fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Diagnostic::InterfaceIgnored { module, interface } => write!(
        f,
        "module {}: both a module file and an interface file ({}) were declared; the interface is ignored",
        module, interface
      ),
    }
  }
}

/// Errors raised by path selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
  #[error("one of a module file or an interface file must be declared")]
  MissingArtifact,
}

/// The outcome of a successful selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
  pub decision: PathDecision,
  pub diagnostics: Vec<Diagnostic>,
}

/// Decide which path `descriptor` takes.
///
/// A module file always wins; a lone interface file means compiling it.
pub fn select_path(descriptor: &ArtifactDescriptor) -> Result<Selection, SelectError> {
  match (&descriptor.module_file, &descriptor.interface_file) {
    (None, None) => Err(SelectError::MissingArtifact),
    (Some(_), Some(interface)) => Ok(Selection {
      decision: PathDecision::Passthrough,
      diagnostics: vec![Diagnostic::InterfaceIgnored {
        module: descriptor.name.clone(),
        interface: interface.clone(),
      }],
    }),
    (Some(_), None) => Ok(Selection {
      decision: PathDecision::Passthrough,
      diagnostics: Vec::new(),
    }),
    (None, Some(_)) => Ok(Selection {
      decision: PathDecision::Compile,
      diagnostics: Vec::new(),
    }),
  }
}
