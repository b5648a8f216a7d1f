//! Compilers for input nodes (UV, Time, ConstFloat).

use crate::compiler::types::{TypedExpr, ValueType};
use crate::compiler::utils::fmt_f32;
use crate::compiler::wgsl::{TIME_LOCAL, UV_LOCAL};
use crate::dsl::{Node, parse_f32};

use super::Emitted;

/// The fragment's normalized screen coordinate.
pub fn compile_uv() -> Emitted {
    Emitted::Value(TypedExpr::new(UV_LOCAL, ValueType::Vec2))
}

/// Seconds from the time uniform.
pub fn compile_time() -> Emitted {
    Emitted::Value(TypedExpr::new(TIME_LOCAL, ValueType::F32))
}

/// Compile a ConstFloat node.
///
/// # Parameters
/// - `value`: number (or numeric string), defaults to 0.0. Non-finite values read as 0.0.
pub fn compile_const_float(node: &Node) -> Emitted {
    let v = parse_f32(&node.params, "value").unwrap_or(0.0);
    Emitted::Value(TypedExpr::new(fmt_f32(v), ValueType::F32))
}
