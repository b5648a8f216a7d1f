//! Core type definitions for the compiler module.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::utils::coerce_to_type;

/// WGSL value type for shader expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    F32,
    Vec2,
    Vec3,
    /// Only used for the fragment output.
    Vec4,
}

impl ValueType {
    /// Returns the WGSL type name for this value type.
    pub fn wgsl(self) -> &'static str {
        match self {
            ValueType::F32 => "f32",
            ValueType::Vec2 => "vec2f",
            ValueType::Vec3 => "vec3f",
            ValueType::Vec4 => "vec4f",
        }
    }

    pub fn components(self) -> usize {
        match self {
            ValueType::F32 => 1,
            ValueType::Vec2 => 2,
            ValueType::Vec3 => 3,
            ValueType::Vec4 => 4,
        }
    }
}

/// A typed WGSL expression.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedExpr {
    pub ty: ValueType,
    pub expr: String,
}

impl TypedExpr {
    pub fn new(expr: impl Into<String>, ty: ValueType) -> Self {
        Self {
            ty,
            expr: expr.into(),
        }
    }

    /// The zero constant of `ty`.
    pub fn zero(ty: ValueType) -> Self {
        let expr = match ty {
            ValueType::F32 => "0.0",
            ValueType::Vec2 => "vec2f(0.0, 0.0)",
            ValueType::Vec3 => "vec3f(0.0, 0.0, 0.0)",
            ValueType::Vec4 => "vec4f(0.0, 0.0, 0.0, 0.0)",
        };
        Self::new(expr, ty)
    }
}

/// Knobs for `compile_with_options`.
///
/// The defaults give the lenient behavior of `compile`: nothing is ever rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileOptions {
    /// Reject graphs whose node ids collapse to the same WGSL identifier instead of
    /// suffixing the later one.
    pub strict_identifiers: bool,
    /// Reject `Expr` nodes whose expression does not parse instead of reading them as `0.0`.
    pub strict_expressions: bool,
}

impl CompileOptions {
    pub fn strict() -> Self {
        Self {
            strict_identifiers: true,
            strict_expressions: true,
        }
    }
}

/// Values already emitted during one compile call, keyed by node id.
///
/// Entries are only ever added after a node's statement has been emitted, so a lookup
/// can never observe a node that comes later in topological order.
#[derive(Debug, Default)]
pub struct Bindings {
    by_node: HashMap<String, TypedExpr>,
}

impl Bindings {
    pub fn bind(&mut self, node_id: &str, value: TypedExpr) {
        self.by_node.insert(node_id.to_string(), value);
    }

    /// Value of `input` as `ty`.
    ///
    /// An input with no binding (unwired, dangling or cut from a cycle) reads as the
    /// zero of `ty`, the same value a coerced vec3 zero would give.
    pub fn want(&self, input: Option<&str>, ty: ValueType) -> TypedExpr {
        self.want_or(input, ty, TypedExpr::zero(ty))
    }

    /// Like [`Bindings::want`] with a kind-specific value for absent inputs.
    pub fn want_or(&self, input: Option<&str>, ty: ValueType, default: TypedExpr) -> TypedExpr {
        match input.and_then(|id| self.by_node.get(id)) {
            Some(value) => coerce_to_type(value, ty),
            None => coerce_to_type(&default, ty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn want_coerces_bound_values() {
        let mut bindings = Bindings::default();
        bindings.bind("k", TypedExpr::new("n_k", ValueType::F32));

        let v = bindings.want(Some("k"), ValueType::Vec3);
        assert_eq!(v, TypedExpr::new("vec3f(n_k)", ValueType::Vec3));
    }

    #[test]
    fn absent_inputs_read_as_zero() {
        let bindings = Bindings::default();
        assert_eq!(bindings.want(None, ValueType::Vec3), TypedExpr::zero(ValueType::Vec3));
        assert_eq!(bindings.want(Some("ghost"), ValueType::F32), TypedExpr::zero(ValueType::F32));
        assert_eq!(bindings.want(Some("ghost"), ValueType::Vec2), TypedExpr::zero(ValueType::Vec2));
    }

    #[test]
    fn want_or_uses_the_default_only_when_absent() {
        let mut bindings = Bindings::default();
        bindings.bind("r", TypedExpr::new("n_r", ValueType::F32));
        let default = TypedExpr::new("0.25", ValueType::F32);

        assert_eq!(bindings.want_or(None, ValueType::F32, default.clone()).expr, "0.25");
        assert_eq!(bindings.want_or(Some("r"), ValueType::F32, default).expr, "n_r");
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: CompileOptions = serde_json::from_str(r#"{"strictIdentifiers": true}"#).unwrap();
        assert!(opts.strict_identifiers);
        assert!(!opts.strict_expressions);
        assert_eq!(CompileOptions::strict(), CompileOptions {
            strict_identifiers: true,
            strict_expressions: true,
        });
    }
}
