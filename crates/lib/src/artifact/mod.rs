//! Artifact descriptors for import nodes.
//!
//! An import node declares already-available files (archives, a compiled
//! module, its documentation, or a textual interface) plus link flags.

mod types;

pub use types::*;
