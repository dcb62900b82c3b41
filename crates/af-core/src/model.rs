//! Core data model for automation graphs.
//!
//! An automation is a directed graph: nodes are typed blocks placed in world
//! coordinates, edges connect a named handle on one block to a named handle
//! on another. Both lists are ordered; an edge's list index is what the
//! backend sees, its [`EdgeId`] is what the editor holds on to.

use crate::data::{Category, NodeData, NodeType};
use crate::error::GraphError;
use crate::handle::HandleId;
use crate::id::{EdgeId, NodeId, fresh_timestamp_id};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

// ─── Geometry primitives ─────────────────────────────────────────────────

/// A point in world (graph) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

// ─── Node ────────────────────────────────────────────────────────────────

/// A block on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireNode", into = "WireNode")]
pub struct Node {
    pub id: NodeId,
    pub position: Point,
    pub data: NodeData,
}

impl Node {
    pub fn new(id: NodeId, node_type: NodeType, position: Point) -> Self {
        Self {
            id,
            position,
            data: NodeData::default_for(node_type),
        }
    }

    pub fn node_type(&self) -> Option<NodeType> {
        self.data.node_type()
    }

    pub fn category(&self) -> Option<Category> {
        self.data.category()
    }

    pub fn type_name(&self) -> &str {
        self.data.type_name()
    }
}

/// Wire shape: `{"id", "type", "position", "data"}`.
#[derive(Serialize, Deserialize)]
struct WireNode {
    id: NodeId,
    #[serde(rename = "type")]
    node_type: String,
    position: Point,
    #[serde(default)]
    data: Value,
}

impl From<WireNode> for Node {
    fn from(wire: WireNode) -> Self {
        Self {
            id: wire.id,
            position: wire.position,
            data: NodeData::from_wire(&wire.node_type, wire.data),
        }
    }
}

impl From<Node> for WireNode {
    fn from(node: Node) -> Self {
        Self {
            id: node.id,
            node_type: node.data.type_name().to_string(),
            data: node.data.to_wire(),
            position: node.position,
        }
    }
}

// ─── Edge ────────────────────────────────────────────────────────────────

/// A directed connection `source.sourceHandle → target.targetHandle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    #[serde(skip, default = "EdgeId::fresh")]
    pub id: EdgeId,
    pub source: NodeId,
    pub source_handle: HandleId,
    pub target: NodeId,
    pub target_handle: HandleId,
}

impl Edge {
    pub fn new(
        source: NodeId,
        source_handle: HandleId,
        target: NodeId,
        target_handle: HandleId,
    ) -> Self {
        Self {
            id: EdgeId::fresh(),
            source,
            source_handle,
            target,
            target_handle,
        }
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }

    /// Same endpoints, ignoring the in-memory id.
    pub fn same_connection(&self, other: &Edge) -> bool {
        self.source == other.source
            && self.source_handle == other.source_handle
            && self.target == other.target
            && self.target_handle == other.target_handle
    }
}

// ─── FlowGraph ───────────────────────────────────────────────────────────

/// The node and edge lists of one automation.
///
/// Every operation is total: unknown ids and out-of-range indices are no-ops.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a block of `node_type` with default data and a fresh id.
    pub fn add_node(&mut self, node_type: NodeType, position: Point) -> Node {
        let mut id = NodeId::generate();
        while self.contains(id) {
            id = NodeId::generate();
        }
        let node = Node::new(id, node_type, position);
        log::debug!("add {node_type} block {id}");
        self.nodes.push(node.clone());
        node
    }

    /// Like [`add_node`](Self::add_node) for an untyped type name.
    pub fn add_node_by_name(&mut self, type_name: &str, position: Point) -> Result<Node, GraphError> {
        let node_type = NodeType::parse(type_name)?;
        Ok(self.add_node(node_type, position))
    }

    /// Insert an already-built node (undo, paste). Replaces a node with the same id.
    pub fn insert_node(&mut self, node: Node) {
        match self.index_of(node.id) {
            Some(i) => self.nodes[i] = node,
            None => self.nodes.push(node),
        }
    }

    /// Remove a node and every edge that references it.
    ///
    /// Returns the removed node and edges, or `None` if the id is unknown.
    pub fn delete_node(&mut self, id: NodeId) -> Option<(Node, Vec<Edge>)> {
        let idx = self.index_of(id)?;
        let node = self.nodes.remove(idx);
        let (removed, kept): (Vec<Edge>, Vec<Edge>) =
            self.edges.drain(..).partition(|e| e.touches(id));
        self.edges = kept;
        log::debug!("delete block {id} with {} edge(s)", removed.len());
        Some((node, removed))
    }

    pub fn delete_edge(&mut self, index: usize) -> Option<Edge> {
        if index < self.edges.len() {
            Some(self.edges.remove(index))
        } else {
            None
        }
    }

    pub fn delete_edge_by_id(&mut self, id: EdgeId) -> Option<Edge> {
        let index = self.edge_index(id)?;
        self.delete_edge(index)
    }

    /// Append an edge. Legality is the caller's concern (see `validate`).
    pub fn add_edge(&mut self, edge: Edge) -> EdgeId {
        let id = edge.id;
        self.edges.push(edge);
        id
    }

    /// Shallow-merge `partial` into a node's data. Returns `false` for an
    /// unknown id.
    ///
    /// The merge always lands; values the node's config cannot hold are
    /// kept verbatim on the wire.
    pub fn update_node_data(&mut self, id: NodeId, partial: &Map<String, Value>) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        node.data.merge(partial);
        true
    }

    /// Replace a node's data wholesale. Returns the previous payload.
    pub fn set_node_data(&mut self, id: NodeId, data: NodeData) -> Option<NodeData> {
        let node = self.node_mut(id)?;
        Some(std::mem::replace(&mut node.data, data))
    }

    /// Move a node. Returns the previous position.
    pub fn update_node_position(&mut self, id: NodeId, position: Point) -> Option<Point> {
        let node = self.node_mut(id)?;
        Some(std::mem::replace(&mut node.position, position))
    }

    // ─── Lookup ──────────────────────────────────────────────────────────

    pub fn contains(&self, id: NodeId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn edge_index(&self, id: EdgeId) -> Option<usize> {
        self.edges.iter().position(|e| e.id == id)
    }

    pub fn edges_of(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.touches(id))
    }

    pub fn has_category(&self, category: Category) -> bool {
        self.nodes.iter().any(|n| n.category() == Some(category))
    }

    /// Directed view of the graph for reachability analysis.
    ///
    /// Edges whose endpoints are missing are skipped.
    pub fn to_digraph(&self) -> (DiGraph<NodeId, EdgeId>, HashMap<NodeId, NodeIndex>) {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        let mut index = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            index.insert(node.id, graph.add_node(node.id));
        }
        for edge in &self.edges {
            if let (Some(&a), Some(&b)) = (index.get(&edge.source), index.get(&edge.target)) {
                graph.add_edge(a, b, edge.id);
            }
        }
        (graph, index)
    }
}

// ─── Automation ──────────────────────────────────────────────────────────

/// A named, persisted graph owned by one user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Automation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(flatten)]
    pub graph: FlowGraph,
}

impl Automation {
    /// A new, empty, inactive automation with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: fresh_timestamp_id(),
            name: name.into(),
            active: false,
            graph: FlowGraph::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn connect(graph: &mut FlowGraph, a: NodeId, b: NodeId) {
        graph.add_edge(Edge::new(a, HandleId::Right, b, HandleId::Left));
    }

    #[test]
    fn add_node_uses_type_defaults() {
        let mut graph = FlowGraph::new();
        let node = graph.add_node(NodeType::IfGate, Point::new(10.0, 20.0));
        assert_eq!(node.data.condition_count(), Some(1));
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.node(node.id).unwrap().position, Point::new(10.0, 20.0));
    }

    #[test]
    fn add_node_by_name_rejects_unknown_type() {
        let mut graph = FlowGraph::new();
        assert!(graph.add_node_by_name("stock_split", Point::default()).is_err());
        assert!(graph.nodes.is_empty());
        assert!(graph.add_node_by_name("webhook", Point::default()).is_ok());
    }

    #[test]
    fn delete_node_cascades_only_incident_edges() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(NodeType::Price, Point::default()).id;
        let b = graph.add_node(NodeType::LogicGate, Point::default()).id;
        let c = graph.add_node(NodeType::Tracking, Point::default()).id;
        let d = graph.add_node(NodeType::Webhook, Point::default()).id;
        connect(&mut graph, a, b);
        connect(&mut graph, b, c);
        connect(&mut graph, a, d);
        connect(&mut graph, b, d);

        let (removed_node, removed_edges) = graph.delete_node(b).unwrap();
        assert_eq!(removed_node.id, b);
        assert_eq!(removed_edges.len(), 3);
        assert_eq!(graph.edges.len(), 1);
        assert!(graph.edges[0].source == a && graph.edges[0].target == d);
        assert!(graph.edges.iter().all(|e| !e.touches(b)));
    }

    #[test]
    fn operations_on_unknown_ids_are_noops() {
        let mut graph = FlowGraph::new();
        let ghost = NodeId::intern("ghost");
        assert!(graph.delete_node(ghost).is_none());
        assert!(graph.delete_edge(3).is_none());
        assert!(graph.update_node_position(ghost, Point::default()).is_none());
        assert!(!graph.update_node_data(ghost, &Map::new()));
    }

    #[test]
    fn node_wire_shape() {
        let node = Node {
            id: NodeId::intern("1700000000000"),
            position: Point::new(100.0, 50.5),
            data: NodeData::from_wire("price", json!({"ticker": "AAPL", "op": ">", "value": 150})),
        };
        let wire = serde_json::to_value(&node).unwrap();
        assert_eq!(
            wire,
            json!({
                "id": "1700000000000",
                "type": "price",
                "position": {"x": 100.0, "y": 50.5},
                "data": {"ticker": "AAPL", "op": ">", "value": 150}
            })
        );
        let back: Node = serde_json::from_value(wire).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn edge_wire_shape_has_no_id() {
        let edge = Edge::new(
            NodeId::intern("1"),
            HandleId::Out(0),
            NodeId::intern("2"),
            HandleId::Left,
        );
        assert_eq!(
            serde_json::to_value(&edge).unwrap(),
            json!({"source": "1", "sourceHandle": "out-0", "target": "2", "targetHandle": "left"})
        );
    }

    #[test]
    fn automation_flattens_graph() {
        let json = json!({
            "id": "42",
            "name": "Dip buyer",
            "active": true,
            "nodes": [
                {"id": "n1", "type": "risk", "position": {"x": 0, "y": 0}, "data": {}},
                {"id": "n2", "type": "quantum_oracle", "position": {"x": 1, "y": 2}, "data": {"k": 1}}
            ],
            "edges": [],
            "user_email": "trader@example.com"
        });
        let automation: Automation = serde_json::from_value(json).unwrap();
        assert_eq!(automation.graph.nodes.len(), 2);
        assert_eq!(automation.graph.nodes[1].type_name(), "quantum_oracle");
        assert_eq!(automation.graph.nodes[1].node_type(), None);
    }

    #[test]
    fn automation_list_tolerates_loosely_typed_payloads() {
        let json = json!([
            {
                "id": "1", "name": "Branches", "active": false,
                "nodes": [
                    {"id": "g", "type": "if_gate", "position": {"x": 0, "y": 0},
                     "data": {"conditions": [{"id": 1718000000000u64}], "elseOutputId": "else"}},
                    {"id": "p", "type": "price", "position": {"x": 0, "y": 200},
                     "data": {"ticker": null, "op": ">", "value": 10}}
                ],
                "edges": [{"source": "p", "sourceHandle": "right", "target": "g", "targetHandle": "in-0"}]
            },
            {"id": "2", "name": "Empty", "active": true, "nodes": [], "edges": []}
        ]);
        let list: Vec<Automation> = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(list.len(), 2);

        let nodes = &list[0].graph.nodes;
        assert_eq!(nodes[0].data.condition_count(), Some(1));
        assert_eq!(nodes[1].category(), Some(Category::Conditional));
        assert!(nodes[1].data.is_raw());
        // Payloads are written back exactly as read.
        for (node, wire) in nodes.iter().zip(json[0]["nodes"].as_array().unwrap()) {
            assert_eq!(node.data.to_wire(), wire["data"]);
        }
    }

    #[test]
    fn update_node_data_accepts_null() {
        let mut graph = FlowGraph::new();
        let price = graph.add_node(NodeType::Price, Point::default()).id;
        assert!(graph.update_node_data(price, json!({"ticker": null}).as_object().unwrap()));
        let node = graph.node(price).unwrap();
        assert_eq!(node.data.to_wire()["ticker"], Value::Null);
        assert_eq!(node.node_type(), Some(NodeType::Price));
    }

    #[test]
    fn digraph_skips_dangling_edges() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(NodeType::Price, Point::default()).id;
        let b = graph.add_node(NodeType::Tracking, Point::default()).id;
        connect(&mut graph, a, b);
        connect(&mut graph, a, NodeId::intern("missing"));
        let (dg, index) = graph.to_digraph();
        assert_eq!(dg.node_count(), 2);
        assert_eq!(dg.edge_count(), 1);
        assert!(index.contains_key(&a));
    }
}
