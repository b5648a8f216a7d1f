//! Compiles node-based shader graphs into WGSL programs.
//!
//! A [`dsl::Graph`] is a list of nodes whose inputs name other nodes. [`compile`] picks the
//! graph's output node, orders the nodes it depends on, and emits a vertex/fragment program.

pub mod compiler;
pub mod dsl;
pub mod graph;
pub mod schema;

pub use compiler::{CompileOptions, FALLBACK_WGSL, compile, compile_with_options, validate_wgsl};
pub use dsl::{Graph, Node};
