//! Utility functions for the compiler module.

use super::types::{TypedExpr, ValueType};

/// Format a float as a WGSL literal. Uses the shortest representation that round-trips
/// (`0.6`, `2.0`, `1e-7`); non-finite values become `0.0`.
pub fn fmt_f32(v: f32) -> String {
    if v.is_finite() {
        format!("{v:?}")
    } else {
        "0.0".to_string()
    }
}

/// Value of a scalar that is a plain float literal, as emitted by [`fmt_f32`].
pub fn literal_value(x: &TypedExpr) -> Option<f32> {
    if x.ty != ValueType::F32 {
        return None;
    }
    x.expr.parse::<f32>().ok().filter(|v| v.is_finite())
}

/// Sanitize a string to be a valid WGSL identifier fragment.
pub fn sanitize_wgsl_ident(s: &str) -> String {
    s.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '_' { ch } else { '_' })
        .collect()
}

fn is_plain_ident(expr: &str) -> bool {
    !expr.is_empty() && expr.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// `expr.<swizzle>`, parenthesizing anything that is not a bare identifier.
pub fn member(expr: &str, swizzle: &str) -> String {
    if is_plain_ident(expr) {
        format!("{expr}.{swizzle}")
    } else {
        format!("({expr}).{swizzle}")
    }
}

/// Convert a typed expression to `target`.
///
/// Scalars replicate into every component, a vec2 gains a zero third component, vectors
/// narrow to a scalar by averaging their components and a vec3 narrows to a vec2 by
/// dropping `z`.
pub fn coerce_to_type(x: &TypedExpr, target: ValueType) -> TypedExpr {
    let e = x.expr.as_str();
    let expr = match (x.ty, target) {
        (ValueType::F32, ValueType::Vec2) => format!("vec2f({e})"),
        (ValueType::F32, ValueType::Vec3) => format!("vec3f({e})"),
        (ValueType::F32, ValueType::Vec4) => format!("vec4f(vec3f({e}), 1.0)"),
        (ValueType::Vec2, ValueType::F32) => {
            format!("(({} + {}) / 2.0)", member(e, "x"), member(e, "y"))
        }
        (ValueType::Vec2, ValueType::Vec3) => format!("vec3f({e}, 0.0)"),
        (ValueType::Vec2, ValueType::Vec4) => format!("vec4f({e}, 0.0, 1.0)"),
        (ValueType::Vec3, ValueType::F32) => format!(
            "(({} + {} + {}) / 3.0)",
            member(e, "x"),
            member(e, "y"),
            member(e, "z")
        ),
        (ValueType::Vec3, ValueType::Vec2) => member(e, "xy"),
        (ValueType::Vec3, ValueType::Vec4) => format!("vec4f({e}, 1.0)"),
        (ValueType::Vec4, ValueType::F32) => format!(
            "(({} + {} + {}) / 3.0)",
            member(e, "x"),
            member(e, "y"),
            member(e, "z")
        ),
        (ValueType::Vec4, ValueType::Vec2) => member(e, "xy"),
        (ValueType::Vec4, ValueType::Vec3) => member(e, "xyz"),
        _ => return x.clone(),
    };
    TypedExpr::new(expr, target)
}
