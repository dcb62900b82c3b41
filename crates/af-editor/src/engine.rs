//! Mutation engine: the single writer of the editor's automation.
//!
//! Tools and editor commands never touch the graph directly; they produce
//! `GraphMutation`s which are applied here. This keeps the dirty flag and
//! the undo stack honest.

use crate::error::EditError;
use af_core::data::NodeData;
use af_core::id::{EdgeId, NodeId};
use af_core::model::{Automation, Edge, FlowGraph, Node, Point};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single change to the automation.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphMutation {
    AddNode { node: Box<Node> },
    /// Removes the node and every edge touching it.
    RemoveNode { id: NodeId },
    MoveNode { id: NodeId, position: Point },
    /// Shallow merge into the node's data.
    UpdateNodeData { id: NodeId, partial: Map<String, Value> },
    SetNodeData { id: NodeId, data: Box<NodeData> },
    AddEdge { edge: Edge },
    RemoveEdge { id: EdgeId },
    Rename { name: String },
}

impl GraphMutation {
    /// Mutations whose inverse is not a single mutation; undo restores a
    /// snapshot of the whole graph instead.
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::RemoveNode { .. } | Self::RemoveEdge { .. })
    }
}

/// Encoded graph state used by snapshot undo steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot(Vec<u8>);

impl Snapshot {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Edge ids are not part of the wire format, so snapshots carry them
/// alongside the graph to keep selection and undo stable.
#[derive(Serialize)]
struct SnapshotRef<'a> {
    graph: &'a FlowGraph,
    edge_ids: Vec<EdgeId>,
}

#[derive(Deserialize)]
struct SnapshotOwned {
    graph: FlowGraph,
    edge_ids: Vec<EdgeId>,
}

/// Owns the automation being edited.
pub struct EditorEngine {
    pub automation: Automation,
    /// Set by every applied change, cleared by [`mark_saved`](Self::mark_saved).
    dirty: bool,
}

impl EditorEngine {
    pub fn new(automation: Automation) -> Self {
        Self {
            automation,
            dirty: false,
        }
    }

    pub fn graph(&self) -> &FlowGraph {
        &self.automation.graph
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Replace the automation wholesale (after a load).
    pub fn load(&mut self, automation: Automation) {
        log::info!(
            "loaded automation {} ({} blocks, {} edges)",
            automation.id,
            automation.graph.nodes.len(),
            automation.graph.edges.len()
        );
        self.automation = automation;
        self.dirty = false;
    }

    /// Apply one mutation. Returns whether anything changed.
    ///
    /// Never fails; mutations naming unknown nodes or edges are no-ops.
    pub fn apply_mutation(&mut self, mutation: GraphMutation) -> bool {
        let graph = &mut self.automation.graph;
        let changed = match mutation {
            GraphMutation::AddNode { node } => {
                graph.insert_node(*node);
                true
            }
            GraphMutation::RemoveNode { id } => graph.delete_node(id).is_some(),
            GraphMutation::MoveNode { id, position } => graph
                .update_node_position(id, position)
                .is_some_and(|old| old != position),
            GraphMutation::UpdateNodeData { id, partial } => graph.update_node_data(id, &partial),
            GraphMutation::SetNodeData { id, data } => graph.set_node_data(id, *data).is_some(),
            GraphMutation::AddEdge { edge } => {
                log::debug!(
                    "connect {}.{} -> {}.{}",
                    edge.source,
                    edge.source_handle,
                    edge.target,
                    edge.target_handle
                );
                graph.add_edge(edge);
                true
            }
            GraphMutation::RemoveEdge { id } => graph.delete_edge_by_id(id).is_some(),
            GraphMutation::Rename { name } => {
                let changed = self.automation.name != name;
                self.automation.name = name;
                changed
            }
        };
        self.dirty |= changed;
        changed
    }

    /// Encode the current graph.
    pub fn snapshot(&self) -> Result<Snapshot, EditError> {
        let graph = &self.automation.graph;
        let state = SnapshotRef {
            graph,
            edge_ids: graph.edges.iter().map(|e| e.id).collect(),
        };
        Ok(Snapshot(rmp_serde::to_vec_named(&state)?))
    }

    /// Replace the graph with a previously taken snapshot.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), EditError> {
        let SnapshotOwned {
            mut graph,
            edge_ids,
        } = rmp_serde::from_slice(&snapshot.0)?;
        for (edge, id) in graph.edges.iter_mut().zip(edge_ids) {
            edge.id = id;
        }
        self.automation.graph = graph;
        self.dirty = true;
        Ok(())
    }
}
