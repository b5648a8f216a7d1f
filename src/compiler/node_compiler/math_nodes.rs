//! Compilers for component-wise vec3 math nodes (Multiply, Add, Saturate).
//!
//! Every input is read as vec3; scalars replicate and vec2 values gain a zero `z`.

use crate::compiler::types::{TypedExpr, ValueType};

use super::{Emitted, NodeInputs};

pub fn compile_multiply(inputs: &NodeInputs<'_>) -> Emitted {
    let a = inputs.want(0, ValueType::Vec3);
    let b = inputs.want(1, ValueType::Vec3);
    Emitted::Value(TypedExpr::new(format!("{} * {}", a.expr, b.expr), ValueType::Vec3))
}

pub fn compile_add(inputs: &NodeInputs<'_>) -> Emitted {
    let a = inputs.want(0, ValueType::Vec3);
    let b = inputs.want(1, ValueType::Vec3);
    Emitted::Value(TypedExpr::new(format!("{} + {}", a.expr, b.expr), ValueType::Vec3))
}

/// Clamp each component to [0, 1].
pub fn compile_saturate(inputs: &NodeInputs<'_>) -> Emitted {
    let x = inputs.want(0, ValueType::Vec3);
    Emitted::Value(TypedExpr::new(
        format!("clamp({}, vec3f(0.0), vec3f(1.0))", x.expr),
        ValueType::Vec3,
    ))
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{bound, value};
    use super::*;

    #[test]
    fn multiply_promotes_scalars() {
        let bindings = bound(&[("two", ValueType::F32), ("three", ValueType::F32)]);
        let inputs = NodeInputs::from_slots(vec![Some("two"), Some("three")], &bindings);
        let out = value(compile_multiply(&inputs));
        assert_eq!(out.ty, ValueType::Vec3);
        assert_eq!(out.expr, "vec3f(n_two) * vec3f(n_three)");
    }

    #[test]
    fn add_mixes_vector_widths() {
        let bindings = bound(&[("uv", ValueType::Vec2), ("c", ValueType::Vec3)]);
        let inputs = NodeInputs::from_slots(vec![Some("uv"), Some("c")], &bindings);
        assert_eq!(value(compile_add(&inputs)).expr, "vec3f(n_uv, 0.0) + n_c");
    }

    #[test]
    fn missing_operands_read_as_zero() {
        let bindings = bound(&[("c", ValueType::Vec3)]);
        let inputs = NodeInputs::from_slots(vec![None, Some("c")], &bindings);
        assert_eq!(value(compile_multiply(&inputs)).expr, "vec3f(0.0, 0.0, 0.0) * n_c");

        let inputs = NodeInputs::from_slots(Vec::new(), &bindings);
        assert_eq!(
            value(compile_add(&inputs)).expr,
            "vec3f(0.0, 0.0, 0.0) + vec3f(0.0, 0.0, 0.0)"
        );
    }

    #[test]
    fn saturate_clamps_replicated_scalar() {
        let bindings = bound(&[("k", ValueType::F32)]);
        let inputs = NodeInputs::from_slots(vec![Some("k")], &bindings);
        assert_eq!(
            value(compile_saturate(&inputs)).expr,
            "clamp(vec3f(n_k), vec3f(0.0), vec3f(1.0))"
        );
    }
}
