use std::collections::{HashMap, HashSet};

use log::warn;

use crate::dsl::{Graph, Node};

/// Pick the output node that drives generation.
///
/// The last `OutputFinal` in array order with a wired first input wins; when none is
/// wired, the last `OutputFinal` wins regardless. `None` means there is no active output.
pub fn select_terminal(graph: &Graph) -> Option<&Node> {
    let mut last: Option<&Node> = None;
    let mut last_wired: Option<&Node> = None;
    for node in graph.nodes.iter().filter(|n| n.node_kind().is_terminal()) {
        if node.input(0).is_some() {
            last_wired = Some(node);
        }
        last = Some(node);
    }
    last_wired.or(last)
}

/// Ids of every node needed to compute `start`, `start` included.
///
/// A node is marked before its inputs are expanded, so cycles stop expanding instead of
/// looping. Ids that do not name a node in the graph are not part of the closure.
pub fn upstream_closure<'a>(graph: &'a Graph, start: &str) -> HashSet<&'a str> {
    let nodes_by_id = graph.nodes_by_id();

    let mut visited: HashSet<&'a str> = HashSet::new();
    let Some(start) = nodes_by_id.get(start) else {
        return visited;
    };
    let mut stack: Vec<&'a Node> = vec![*start];
    while let Some(n) = stack.pop() {
        if !visited.insert(n.id.as_str()) {
            continue;
        }
        for slot in 0..n.inputs.len() {
            let Some(dep) = n.input(slot).and_then(|id| nodes_by_id.get(id)) else {
                continue;
            };
            if !visited.contains(dep.id.as_str()) {
                stack.push(*dep);
            }
        }
    }
    visited
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Open,
    Done,
}

/// Nodes in dependency order, plus the input slots that closed a cycle.
#[derive(Debug, Clone, Default)]
pub struct TopoOrder<'a> {
    nodes: Vec<&'a Node>,
    back_edges: HashSet<(&'a str, usize)>,
}

impl<'a> TopoOrder<'a> {
    pub fn nodes(&self) -> &[&'a Node] {
        &self.nodes
    }

    pub fn ids(&self) -> Vec<&'a str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `slot` of `node_id` points back at a node still being visited, i.e. the
    /// wire closes a cycle. Such inputs compile as if unwired.
    pub fn is_back_edge(&self, node_id: &str, slot: usize) -> bool {
        self.back_edges.contains(&(node_id, slot))
    }

    pub fn back_edge_count(&self) -> usize {
        self.back_edges.len()
    }

    /// Keep only nodes in `keep`, without reordering.
    pub fn retain(mut self, keep: &HashSet<&str>) -> Self {
        self.nodes.retain(|n| keep.contains(n.id.as_str()));
        self.back_edges.retain(|(id, _)| keep.contains(id));
        self
    }
}

/// Depth-first topological sort over the whole graph.
///
/// Every node is a DFS root in array order and inputs are visited in slot order, so the
/// result is fully determined by those two orders. Unwired and dangling inputs are
/// skipped. An input that reaches a node still on the DFS stack is recorded as a back
/// edge rather than followed.
pub fn topo_sort(graph: &Graph) -> TopoOrder<'_> {
    let nodes_by_id = graph.nodes_by_id();
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(graph.nodes.len());
    let mut order = TopoOrder {
        nodes: Vec::with_capacity(graph.nodes.len()),
        back_edges: HashSet::new(),
    };

    for root in &graph.nodes {
        if marks.contains_key(root.id.as_str()) {
            continue;
        }
        marks.insert(root.id.as_str(), Mark::Open);
        let mut stack: Vec<(&Node, usize)> = vec![(root, 0)];

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let slot = frame.1;
            if slot >= node.inputs.len() {
                stack.pop();
                marks.insert(node.id.as_str(), Mark::Done);
                order.nodes.push(node);
                continue;
            }
            frame.1 += 1;

            let Some(dep) = node.input(slot).and_then(|id| nodes_by_id.get(id).copied()) else {
                continue;
            };
            match marks.get(dep.id.as_str()) {
                None => {
                    marks.insert(dep.id.as_str(), Mark::Open);
                    stack.push((dep, 0));
                }
                Some(Mark::Open) => {
                    warn!(
                        "cycle: input {slot} of node {:?} points back at {:?}; treating it as unwired",
                        node.id, dep.id
                    );
                    order.back_edges.insert((node.id.as_str(), slot));
                }
                Some(Mark::Done) => {}
            }
        }
    }
    order
}
