//! Node scheme shared with the editor: which kinds exist, their input slots and the
//! params the editor fills in by default.

use std::collections::HashMap;

use anyhow::{Result, anyhow};
use serde::Deserialize;

use crate::compiler::types::ValueType;
use crate::dsl::NodeKind;

const DEFAULT_NODE_SCHEME_JSON: &str = include_str!("../assets/node-scheme.json");

#[derive(Debug, Clone, Deserialize)]
pub struct NodeScheme {
    pub version: String,
    pub nodes: HashMap<String, NodeTypeScheme>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeTypeScheme {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub inputs: Vec<PortScheme>,
    #[serde(default)]
    pub output: Option<PortType>,
    #[serde(rename = "defaultParams", default)]
    pub default_params: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortScheme {
    pub id: String,
    #[serde(rename = "type")]
    pub port_type: PortType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortType {
    #[serde(alias = "f32", alias = "scalar")]
    Float,
    #[serde(alias = "vector2")]
    Vec2,
    #[serde(alias = "vector3", alias = "color")]
    Vec3,
}

impl PortType {
    pub fn value_type(self) -> ValueType {
        match self {
            PortType::Float => ValueType::F32,
            PortType::Vec2 => ValueType::Vec2,
            PortType::Vec3 => ValueType::Vec3,
        }
    }
}

impl NodeScheme {
    /// Scheme entry for an editor kind name, matched the same way the compiler matches kinds.
    pub fn node(&self, kind: &str) -> Option<&NodeTypeScheme> {
        let kind = NodeKind::from_name(kind);
        if kind == NodeKind::Unknown {
            return None;
        }
        self.nodes.get(kind.name())
    }
}

pub fn load_default_scheme() -> Result<NodeScheme> {
    parse_scheme(DEFAULT_NODE_SCHEME_JSON)
        .map_err(|e| anyhow!("failed to parse assets/node-scheme.json: {e}"))
}

pub fn parse_scheme(text: &str) -> Result<NodeScheme> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_scheme_covers_every_kind() {
        let scheme = load_default_scheme().unwrap();
        for kind in NodeKind::ALL {
            let entry = scheme
                .node(kind.name())
                .unwrap_or_else(|| panic!("scheme has no entry for {}", kind.name()));
            assert_eq!(
                entry.inputs.len(),
                kind.input_count(),
                "{}: input slot count",
                kind.name()
            );
            assert_eq!(
                entry.output.map(PortType::value_type),
                kind.output_type(),
                "{}: output type",
                kind.name()
            );
        }
        assert_eq!(scheme.nodes.len(), NodeKind::ALL.len());
    }

    #[test]
    fn lookup_uses_kind_matching() {
        let scheme = load_default_scheme().unwrap();
        assert!(scheme.node("output_final").is_some());
        assert!(scheme.node("Gradient").is_none());
    }

    #[test]
    fn port_type_aliases() {
        let scheme = parse_scheme(
            r#"{"version": "1", "nodes": {"X": {"inputs": [{"id": "c", "type": "color"}], "output": "scalar"}}}"#,
        )
        .unwrap();
        let x = &scheme.nodes["X"];
        assert_eq!(x.inputs[0].port_type, PortType::Vec3);
        assert_eq!(x.output, Some(PortType::Float));
        assert!(x.category.is_none());
    }

    #[test]
    fn malformed_scheme_is_an_error() {
        assert!(parse_scheme(r#"{"nodes": 3}"#).is_err());
    }
}
