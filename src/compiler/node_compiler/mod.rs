//! Per-kind code generation.

pub mod expr_nodes;
pub mod field_nodes;
pub mod input_nodes;
pub mod math_nodes;
pub mod output_nodes;

use anyhow::Result;

use crate::dsl::{Node, NodeKind};
use crate::graph::TopoOrder;

use super::types::{Bindings, CompileOptions, TypedExpr, ValueType};

/// What compiling one node contributes to the fragment body.
#[derive(Clone, Debug, PartialEq)]
pub enum Emitted {
    /// A value later nodes may consume; the assembler binds it to a `let`.
    Value(TypedExpr),
    /// A complete statement that binds nothing (output nodes).
    Sink(String),
}

/// Input slots of the node being compiled, resolved against the values emitted so far.
pub struct NodeInputs<'a> {
    slots: Vec<Option<&'a str>>,
    bindings: &'a Bindings,
}

impl<'a> NodeInputs<'a> {
    /// Slots of `node`, with wires that close a cycle in `order` masked out.
    pub fn new(node: &'a Node, order: &TopoOrder<'_>, bindings: &'a Bindings) -> Self {
        let slots = (0..node.inputs.len())
            .map(|slot| node.input(slot).filter(|_| !order.is_back_edge(&node.id, slot)))
            .collect();
        Self { slots, bindings }
    }

    pub fn from_slots(slots: Vec<Option<&'a str>>, bindings: &'a Bindings) -> Self {
        Self { slots, bindings }
    }

    pub fn slot(&self, slot: usize) -> Option<&'a str> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn want(&self, slot: usize, ty: ValueType) -> TypedExpr {
        self.bindings.want(self.slot(slot), ty)
    }

    pub fn want_or(&self, slot: usize, ty: ValueType, default: TypedExpr) -> TypedExpr {
        self.bindings.want_or(self.slot(slot), ty, default)
    }
}

/// Dispatch to the compiler for `node`'s kind.
///
/// Unknown kinds compile to a constant black vec3. Errors only come out of strict modes.
pub fn compile_node(node: &Node, inputs: &NodeInputs<'_>, options: &CompileOptions) -> Result<Emitted> {
    let emitted = match node.node_kind() {
        NodeKind::Uv => input_nodes::compile_uv(),
        NodeKind::Time => input_nodes::compile_time(),
        NodeKind::ConstFloat => input_nodes::compile_const_float(node),
        NodeKind::Expr => expr_nodes::compile_expr(node, inputs, options)?,
        NodeKind::CircleField => field_nodes::compile_circle_field(node, inputs),
        NodeKind::Multiply => math_nodes::compile_multiply(inputs),
        NodeKind::Add => math_nodes::compile_add(inputs),
        NodeKind::Saturate => math_nodes::compile_saturate(inputs),
        NodeKind::OutputFinal => output_nodes::compile_output_final(inputs),
        NodeKind::Unknown => {
            log::warn!("node {:?} has unknown kind {:?}; emitting black", node.id, node.kind);
            Emitted::Value(TypedExpr::zero(ValueType::Vec3))
        }
    };
    Ok(emitted)
}

#[cfg(test)]
pub mod test_utils {
    use super::*;

    /// Bindings where each `(id, ty)` is bound to `n_<id>`.
    pub fn bound(values: &[(&str, ValueType)]) -> Bindings {
        let mut bindings = Bindings::default();
        for (id, ty) in values {
            bindings.bind(id, TypedExpr::new(format!("n_{id}"), *ty));
        }
        bindings
    }

    pub fn value(emitted: Emitted) -> TypedExpr {
        match emitted {
            Emitted::Value(v) => v,
            Emitted::Sink(s) => panic!("expected a value, got sink statement {s:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use super::*;
    use crate::dsl::Graph;
    use crate::graph::topo_sort;

    #[test]
    fn unknown_kinds_compile_to_black() {
        let node = Node::new("x", "Voronoi").with_inputs([Some("k")]);
        let bindings = bound(&[("k", ValueType::F32)]);
        let inputs = NodeInputs::from_slots(vec![Some("k")], &bindings);
        let out = value(compile_node(&node, &inputs, &CompileOptions::strict()).unwrap());
        assert_eq!(out, TypedExpr::zero(ValueType::Vec3));
    }

    #[test]
    fn every_known_kind_declares_its_output_type() {
        let bindings = Bindings::default();
        for kind in NodeKind::ALL {
            let node = Node::new("n", kind.name());
            let inputs = NodeInputs::from_slots(Vec::new(), &bindings);
            let emitted = compile_node(&node, &inputs, &CompileOptions::default()).unwrap();
            match (emitted, kind.output_type()) {
                (Emitted::Value(v), Some(ty)) => assert_eq!(v.ty, ty, "{}", kind.name()),
                (Emitted::Sink(_), None) => {}
                (other, ty) => panic!("{}: {other:?} vs declared {ty:?}", kind.name()),
            }
        }
    }

    #[test]
    fn back_edges_are_masked() {
        let graph = Graph::new(vec![
            Node::new("x", "Add").with_inputs([Some("y"), None]),
            Node::new("y", "Saturate").with_inputs([Some("x")]),
        ]);
        let order = topo_sort(&graph);
        let bindings = bound(&[("x", ValueType::Vec3)]);

        let y = &graph.nodes[1];
        let inputs = NodeInputs::new(y, &order, &bindings);
        assert_eq!(inputs.slot(0), None);
        assert_eq!(inputs.want(0, ValueType::F32).expr, "0.0");

        let x = &graph.nodes[0];
        let inputs = NodeInputs::new(x, &order, &bindings);
        assert_eq!(inputs.slot(0), Some("y"));
        assert_eq!(inputs.want(0, ValueType::F32).expr, "0.0");
    }
}
