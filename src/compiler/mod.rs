//! Graph-to-WGSL compilation.
//!
//! Submodules:
//! - `types`: value types, typed expressions, options, emitted bindings
//! - `utils`: number formatting, identifier sanitizing, type coercion
//! - `idents`: per-node WGSL identifier allocation
//! - `expr`: parser and lowering for `Expr` node text
//! - `node_compiler`: per-kind code generation
//! - `wgsl`: program assembly and the fallback program
//! - `validation`: WGSL validation using naga

pub mod expr;
pub mod idents;
pub mod node_compiler;
pub mod types;
pub mod utils;
pub mod validation;
pub mod wgsl;

pub use types::{CompileOptions, TypedExpr, ValueType};
pub use validation::{validate_wgsl, validate_wgsl_with_context};
pub use wgsl::{FALLBACK_WGSL, compile, compile_with_options};
