//! Compiler for the OutputFinal sink.

use crate::compiler::types::ValueType;
use crate::compiler::wgsl::FINAL_COLOR_LOCAL;

use super::{Emitted, NodeInputs};

/// Assign the color input (black when unwired) to the fragment's final color.
pub fn compile_output_final(inputs: &NodeInputs<'_>) -> Emitted {
    let color = inputs.want(0, ValueType::Vec3);
    Emitted::Sink(format!("{FINAL_COLOR_LOCAL} = {};", color.expr))
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::bound;
    use super::*;

    #[test]
    fn assigns_coerced_color() {
        let bindings = bound(&[("field", ValueType::F32)]);
        let inputs = NodeInputs::from_slots(vec![Some("field")], &bindings);
        assert_eq!(
            compile_output_final(&inputs),
            Emitted::Sink("final_color = vec3f(n_field);".to_string())
        );
    }

    #[test]
    fn unwired_output_is_black() {
        let bindings = bound(&[]);
        let inputs = NodeInputs::from_slots(vec![None], &bindings);
        assert_eq!(
            compile_output_final(&inputs),
            Emitted::Sink("final_color = vec3f(0.0, 0.0, 0.0);".to_string())
        );
    }
}
