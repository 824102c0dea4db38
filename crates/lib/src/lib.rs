//! modlink-lib: Core types and logic for modlink
//!
//! This crate evaluates module-import nodes of a build graph:
//! - `ArtifactDescriptor`: the files and flags declared by one import node
//! - `select`: chooses between passing a compiled module through and compiling its interface
//! - `merge`: composes a node's own artifacts with its dependencies' metadata bundles
//! - `eval`: the single-node entry point tying the two together
//! - `graph`: a host driver that evaluates a whole manifest of nodes wave by wave

pub mod artifact;
pub mod consts;
pub mod context;
pub mod eval;
pub mod graph;
pub mod merge;
pub mod select;
pub mod toolchain;
pub mod util;
