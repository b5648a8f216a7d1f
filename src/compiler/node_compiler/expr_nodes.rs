//! Compiler for Expr nodes (user-typed scalar expressions).

use anyhow::{Result, bail};

use crate::compiler::expr::{ExprEnv, compile_scalar_expr};
use crate::compiler::types::{CompileOptions, TypedExpr, ValueType};
use crate::compiler::wgsl::{TIME_LOCAL, UV_LOCAL};
use crate::dsl::{Node, parse_str};

use super::{Emitted, NodeInputs};

/// Compile an Expr node.
///
/// # Parameters
/// - `expr`: expression over `a`, `b`, `time`, `uv` (see [`crate::compiler::expr`]).
///   Missing or blank text reads as `0`.
///
/// # Inputs
/// - slot 0 `a`, slot 1 `b`: read as f32, 0.0 when unwired.
///
/// A malformed expression compiles to `0.0`, or fails under `strict_expressions`.
pub fn compile_expr(node: &Node, inputs: &NodeInputs<'_>, options: &CompileOptions) -> Result<Emitted> {
    let src = parse_str(&node.params, "expr")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("0");

    let env = ExprEnv {
        a: inputs.want(0, ValueType::F32),
        b: inputs.want(1, ValueType::F32),
        time: TypedExpr::new(TIME_LOCAL, ValueType::F32),
        uv: TypedExpr::new(UV_LOCAL, ValueType::Vec2),
    };

    match compile_scalar_expr(src, &env) {
        Ok(value) => Ok(Emitted::Value(value)),
        Err(e) if options.strict_expressions => {
            bail!("Expr node {:?}: cannot compile {src:?}: {e:#}", node.id)
        }
        Err(e) => {
            log::warn!("Expr node {:?}: {e:#}; using 0.0", node.id);
            Ok(Emitted::Value(TypedExpr::zero(ValueType::F32)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{bound, value};
    use super::*;
    use serde_json::json;

    fn expr_node(src: &str) -> Node {
        Node::new("e", "Expr").with_param("expr", json!(src))
    }

    #[test]
    fn inputs_are_read_as_scalars() {
        let bindings = bound(&[("k", ValueType::F32), ("c", ValueType::Vec3)]);
        let inputs = NodeInputs::from_slots(vec![Some("k"), Some("c")], &bindings);
        let out = value(compile_expr(&expr_node("a + b"), &inputs, &CompileOptions::default()).unwrap());
        assert_eq!(out, TypedExpr::new("(n_k + ((n_c.x + n_c.y + n_c.z) / 3.0))", ValueType::F32));
    }

    #[test]
    fn unwired_inputs_are_zero() {
        let bindings = bound(&[]);
        let inputs = NodeInputs::from_slots(vec![None, None], &bindings);
        let out = value(compile_expr(&expr_node("a * 2 + b"), &inputs, &CompileOptions::default()).unwrap());
        assert_eq!(out.expr, "0.0");

        // Unwired inputs must not leave a constant division by zero behind.
        let out = value(compile_expr(&expr_node("a / b"), &inputs, &CompileOptions::strict()).unwrap());
        assert_eq!(out, TypedExpr::zero(ValueType::F32));
    }

    #[test]
    fn reserved_words_inside_identifiers_are_left_alone() {
        let bindings = bound(&[("k", ValueType::F32)]);
        let inputs = NodeInputs::from_slots(vec![Some("k")], &bindings);
        let out = value(
            compile_expr(&expr_node("abs(sin(a * u_time)) * uv.y"), &inputs, &CompileOptions::default())
                .unwrap(),
        );
        assert_eq!(out.expr, "(abs(sin((n_k * u_time))) * uv.y)");
    }

    #[test]
    fn blank_expression_is_zero() {
        let bindings = bound(&[]);
        let inputs = NodeInputs::from_slots(Vec::new(), &bindings);
        let out = value(compile_expr(&expr_node("  "), &inputs, &CompileOptions::strict()).unwrap());
        assert_eq!(out.expr, "0.0");
        let out = value(compile_expr(&Node::new("e", "Expr"), &inputs, &CompileOptions::strict()).unwrap());
        assert_eq!(out.expr, "0.0");
    }

    #[test]
    fn malformed_expression_degrades_or_fails_in_strict_mode() {
        let bindings = bound(&[]);
        let inputs = NodeInputs::from_slots(Vec::new(), &bindings);
        let node = expr_node("a + * b");

        let out = value(compile_expr(&node, &inputs, &CompileOptions::default()).unwrap());
        assert_eq!(out, TypedExpr::zero(ValueType::F32));

        let err = compile_expr(&node, &inputs, &CompileOptions::strict()).unwrap_err();
        assert!(format!("{err:#}").contains("a + * b"));
    }
}
