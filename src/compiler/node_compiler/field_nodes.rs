//! Compilers for scalar field nodes.

use crate::compiler::types::{TypedExpr, ValueType};
use crate::compiler::utils::{fmt_f32, literal_value};
use crate::compiler::wgsl::UV_LOCAL;
use crate::dsl::{Node, parse_f32};

use super::{Emitted, NodeInputs};

pub const DEFAULT_RADIUS: f32 = 0.25;
pub const DEFAULT_EDGE: f32 = 0.02;
/// Lower bound on edge softness; keeps smoothstep's edges distinct.
pub const MIN_EDGE: f32 = 0.0001;

/// A scalar operand that is either known now or only at shader run time.
enum Operand {
    Const(f32),
    Wgsl(String),
}

impl Operand {
    fn wgsl(&self) -> String {
        match self {
            Operand::Const(v) => fmt_f32(*v),
            Operand::Wgsl(e) => e.clone(),
        }
    }
}

fn scalar_input(inputs: &NodeInputs<'_>, slot: usize, default: f32) -> Operand {
    let value = inputs.want_or(slot, ValueType::F32, TypedExpr::new(fmt_f32(default), ValueType::F32));
    match literal_value(&value) {
        Some(v) => Operand::Const(v),
        None => Operand::Wgsl(value.expr),
    }
}

/// `lhs op rhs`, folded when both sides are constants.
fn fold(lhs: &Operand, op: char, rhs: &Operand) -> String {
    match (lhs, rhs) {
        (Operand::Const(l), Operand::Const(r)) => {
            let v = if op == '+' { l + r } else { l - r };
            fmt_f32(v)
        }
        _ => format!("{} {op} {}", lhs.wgsl(), rhs.wgsl()),
    }
}

/// Compile a CircleField node: 1 inside a circle centred on the canvas, 0 outside.
///
/// # Inputs
/// - slot 0 `R`: radius. Unwired reads `params.radius`, then 0.25.
/// - slot 1 `E`: edge softness. Unwired reads `params.edge`, then 0.02. Floored to `MIN_EDGE`.
///
/// # Output
/// - Type: f32
pub fn compile_circle_field(node: &Node, inputs: &NodeInputs<'_>) -> Emitted {
    let radius = parse_f32(&node.params, "radius")
        .filter(|v| v.is_finite())
        .unwrap_or(DEFAULT_RADIUS);
    let edge = parse_f32(&node.params, "edge")
        .filter(|v| v.is_finite())
        .unwrap_or(DEFAULT_EDGE);

    let r = scalar_input(inputs, 0, radius);
    let e = match scalar_input(inputs, 1, edge) {
        Operand::Const(v) => Operand::Const(v.max(MIN_EDGE)),
        Operand::Wgsl(x) => Operand::Wgsl(format!("max({x}, {})", fmt_f32(MIN_EDGE))),
    };

    let expr = format!(
        "1.0 - smoothstep({}, {}, distance({UV_LOCAL}, vec2f(0.5, 0.5)))",
        fold(&r, '-', &e),
        fold(&r, '+', &e),
    );
    Emitted::Value(TypedExpr::new(expr, ValueType::F32))
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{bound, value};
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_folded() {
        let bindings = bound(&[]);
        let inputs = NodeInputs::from_slots(vec![None, None], &bindings);
        let out = value(compile_circle_field(&Node::new("c", "CircleField"), &inputs));
        assert_eq!(out.ty, ValueType::F32);
        assert_eq!(
            out.expr,
            format!(
                "1.0 - smoothstep({}, {}, distance(uv, vec2f(0.5, 0.5)))",
                fmt_f32(0.25 - 0.02),
                fmt_f32(0.25 + 0.02)
            )
        );
    }

    #[test]
    fn wired_inputs_are_used_and_edge_is_floored() {
        let bindings = bound(&[("r", ValueType::F32), ("e", ValueType::F32)]);
        let inputs = NodeInputs::from_slots(vec![Some("r"), Some("e")], &bindings);
        let out = value(compile_circle_field(&Node::new("c", "CircleField"), &inputs));
        let eps = fmt_f32(MIN_EDGE);
        assert_eq!(
            out.expr,
            format!(
                "1.0 - smoothstep(n_r - max(n_e, {eps}), n_r + max(n_e, {eps}), distance(uv, vec2f(0.5, 0.5)))"
            )
        );
    }

    #[test]
    fn params_override_defaults_and_zero_edge_is_floored() {
        let bindings = bound(&[("r", ValueType::Vec3)]);
        let inputs = NodeInputs::from_slots(vec![Some("r"), None], &bindings);
        let node = Node::new("c", "CircleField").with_param("edge", json!(0.0));
        let out = value(compile_circle_field(&node, &inputs));
        let r = "((n_r.x + n_r.y + n_r.z) / 3.0)";
        let eps = fmt_f32(MIN_EDGE);
        assert_eq!(
            out.expr,
            format!("1.0 - smoothstep({r} - {eps}, {r} + {eps}, distance(uv, vec2f(0.5, 0.5)))")
        );

        let inputs = NodeInputs::from_slots(vec![None, None], &bindings);
        let node = Node::new("c", "CircleField").with_param("radius", json!(0.5));
        let out = value(compile_circle_field(&node, &inputs));
        assert!(out.expr.starts_with(&format!("1.0 - smoothstep({}, ", fmt_f32(0.5 - 0.02))));
    }

    #[test]
    fn dangling_inputs_fall_back_to_params() {
        let bindings = bound(&[]);
        let inputs = NodeInputs::from_slots(vec![Some("ghost"), Some("gone")], &bindings);
        let node = Node::new("c", "CircleField")
            .with_param("radius", json!(0.4))
            .with_param("edge", json!(0.1));
        let out = value(compile_circle_field(&node, &inputs));
        assert_eq!(
            out.expr,
            format!(
                "1.0 - smoothstep({}, {}, distance(uv, vec2f(0.5, 0.5)))",
                fmt_f32(0.4 - 0.1),
                fmt_f32(0.4 + 0.1)
            )
        );
    }
}
