use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::compiler::types::ValueType;
use crate::schema;

/// Editor snapshot of a shading graph.
///
/// `nodes` order is significant: it breaks ties between output nodes and fixes the
/// DFS root order used for topological sorting.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Editor bookkeeping used for drawing wires. Compilation derives all ordering from
    /// `Node::inputs` and never reads this list.
    #[serde(default)]
    pub edges: Vec<Edge>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type", alias = "kind")]
    pub kind: String,
    /// Upstream node ids, one per input slot. `None` is an unwired slot.
    #[serde(default)]
    pub inputs: Vec<Option<String>>,
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Edge {
    pub from: Pin,
    pub to: Pin,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Pin {
    pub node: String,
    pub pin: usize,
}

/// Node kinds understood by the compiler.
///
/// The editor stores kinds as free strings; anything not listed here is `Unknown` and
/// compiles to a constant black value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Uv,
    Time,
    ConstFloat,
    Expr,
    CircleField,
    Multiply,
    Add,
    Saturate,
    OutputFinal,
    Unknown,
}

impl NodeKind {
    pub const ALL: [NodeKind; 9] = [
        NodeKind::Uv,
        NodeKind::Time,
        NodeKind::ConstFloat,
        NodeKind::Expr,
        NodeKind::CircleField,
        NodeKind::Multiply,
        NodeKind::Add,
        NodeKind::Saturate,
        NodeKind::OutputFinal,
    ];

    /// Parse an editor kind name. Matching ignores ASCII case, `_` and `-`, so
    /// `OutputFinal`, `output_final` and `outputfinal` are the same kind.
    pub fn from_name(name: &str) -> Self {
        let key: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "uv" => NodeKind::Uv,
            "time" => NodeKind::Time,
            "constfloat" => NodeKind::ConstFloat,
            "expr" => NodeKind::Expr,
            "circlefield" => NodeKind::CircleField,
            "multiply" => NodeKind::Multiply,
            "add" => NodeKind::Add,
            "saturate" => NodeKind::Saturate,
            "outputfinal" => NodeKind::OutputFinal,
            _ => NodeKind::Unknown,
        }
    }

    /// Canonical editor spelling.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Uv => "UV",
            NodeKind::Time => "Time",
            NodeKind::ConstFloat => "ConstFloat",
            NodeKind::Expr => "Expr",
            NodeKind::CircleField => "CircleField",
            NodeKind::Multiply => "Multiply",
            NodeKind::Add => "Add",
            NodeKind::Saturate => "Saturate",
            NodeKind::OutputFinal => "OutputFinal",
            NodeKind::Unknown => "Unknown",
        }
    }

    pub fn input_count(self) -> usize {
        match self {
            NodeKind::Uv | NodeKind::Time | NodeKind::ConstFloat | NodeKind::Unknown => 0,
            NodeKind::Saturate | NodeKind::OutputFinal => 1,
            NodeKind::Expr | NodeKind::CircleField | NodeKind::Multiply | NodeKind::Add => 2,
        }
    }

    /// Declared output type; `None` for sinks.
    pub fn output_type(self) -> Option<ValueType> {
        match self {
            NodeKind::Uv => Some(ValueType::Vec2),
            NodeKind::Time | NodeKind::ConstFloat | NodeKind::Expr | NodeKind::CircleField => {
                Some(ValueType::F32)
            }
            NodeKind::Multiply | NodeKind::Add | NodeKind::Saturate | NodeKind::Unknown => {
                Some(ValueType::Vec3)
            }
            NodeKind::OutputFinal => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == NodeKind::OutputFinal
    }
}

impl Node {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            inputs: Vec::new(),
            params: HashMap::new(),
        }
    }

    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        self.inputs = inputs.into_iter().map(|i| i.map(Into::into)).collect();
        self
    }

    pub fn with_param(mut self, key: &str, value: serde_json::Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    pub fn node_kind(&self) -> NodeKind {
        NodeKind::from_name(&self.kind)
    }

    /// Upstream id wired into `slot`. Empty ids and self references read as unwired.
    pub fn input(&self, slot: usize) -> Option<&str> {
        self.inputs
            .get(slot)?
            .as_deref()
            .filter(|id| !id.is_empty() && *id != self.id)
    }
}

impl Graph {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            edges: Vec::new(),
        }
    }

    /// Id lookup table. When ids repeat, the first node in array order wins.
    pub fn nodes_by_id(&self) -> HashMap<&str, &Node> {
        let mut map: HashMap<&str, &Node> = HashMap::with_capacity(self.nodes.len());
        for n in &self.nodes {
            map.entry(n.id.as_str()).or_insert(n);
        }
        map
    }
}

pub fn load_graph_from_str(text: &str) -> Result<Graph> {
    let mut graph: Graph = serde_json::from_str(text).context("failed to parse graph json")?;
    normalize_graph_defaults(&mut graph)?;
    Ok(graph)
}

pub fn load_graph_from_path(path: impl AsRef<std::path::Path>) -> Result<Graph> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read graph json at {}", path.display()))?;
    load_graph_from_str(&text).with_context(|| format!("invalid graph in {}", path.display()))
}

/// Fill omitted params from the bundled node scheme and pad input lists to the kind's
/// slot count. Hand-written or older snapshots often leave both out.
pub fn normalize_graph_defaults(graph: &mut Graph) -> Result<()> {
    let scheme = schema::load_default_scheme()?;
    apply_node_defaults(graph, &scheme);
    Ok(())
}

fn apply_node_defaults(graph: &mut Graph, scheme: &schema::NodeScheme) {
    for node in &mut graph.nodes {
        let Some(node_scheme) = scheme.node(&node.kind) else {
            continue;
        };

        if node.inputs.len() < node_scheme.inputs.len() {
            node.inputs.resize(node_scheme.inputs.len(), None);
        }

        if node_scheme.default_params.is_empty() {
            continue;
        }
        let mut merged = node_scheme.default_params.clone();
        for (k, v) in std::mem::take(&mut node.params) {
            merged.insert(k, v);
        }
        node.params = merged;
    }
}

pub fn parse_f32(params: &HashMap<String, serde_json::Value>, key: &str) -> Option<f32> {
    match params.get(key) {
        Some(v) => v
            .as_f64()
            .map(|x| x as f32)
            .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f32>().ok())),
        None => None,
    }
}

pub fn parse_str<'a>(params: &'a HashMap<String, serde_json::Value>, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}
