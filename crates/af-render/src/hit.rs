//! Hit testing: world point → handle, node, or edge.
//!
//! Later nodes are on top of earlier ones. Within a node, handles win over
//! the body (they straddle its border); any node wins over edges.

use crate::path::{edge_at, node_rect, to_kurbo};
use af_core::geometry::{HandleResolver, handles};
use af_core::handle::HandleId;
use af_core::id::{EdgeId, NodeId};
use af_core::model::{FlowGraph, Node, Point};

/// What lies under the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hit {
    Handle { node: NodeId, handle: HandleId },
    Node(NodeId),
    Edge(EdgeId),
    Canvas,
}

/// Find what is at world position `p`.
///
/// `tolerance` is the pick radius for handles and edges, in world units.
/// Nodes are visited from the top down; each node's handles are tried
/// before its body, so a node hides the handles of nodes beneath it.
pub fn hit_test(graph: &FlowGraph, resolver: &HandleResolver, p: Point, tolerance: f64) -> Hit {
    let target = to_kurbo(p);
    for node in graph.nodes.iter().rev() {
        if let Some(handle) = handle_near(resolver, node, p, tolerance) {
            return Hit::Handle {
                node: node.id,
                handle,
            };
        }
        if node_rect(resolver, node).contains(target) {
            return Hit::Node(node.id);
        }
    }
    match edge_at(graph, resolver, p, tolerance) {
        Some(edge) => Hit::Edge(edge),
        None => Hit::Canvas,
    }
}

/// Handle of `node` within `tolerance` of `p`.
pub fn handle_near(
    resolver: &HandleResolver,
    node: &Node,
    p: Point,
    tolerance: f64,
) -> Option<HandleId> {
    let r2 = tolerance * tolerance;
    handles(node).into_iter().find(|handle| {
        let anchor = resolver.anchor(node, handle);
        let (dx, dy) = (anchor.x - p.x, anchor.y - p.y);
        dx * dx + dy * dy <= r2
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use af_core::data::NodeType;
    use af_core::model::Edge;

    #[test]
    fn handle_beats_body() {
        let mut graph = FlowGraph::new();
        let id = graph.add_node(NodeType::Risk, Point::new(0.0, 0.0)).id;
        let resolver = HandleResolver::new();
        assert_eq!(
            hit_test(&graph, &resolver, Point::new(318.0, 51.0), 8.0),
            Hit::Handle {
                node: id,
                handle: HandleId::Right
            }
        );
        assert_eq!(hit_test(&graph, &resolver, Point::new(150.0, 50.0), 8.0), Hit::Node(id));
    }

    #[test]
    fn later_node_is_on_top() {
        let mut graph = FlowGraph::new();
        graph.add_node(NodeType::Price, Point::new(0.0, 0.0));
        let top = graph.add_node(NodeType::Webhook, Point::new(100.0, 20.0)).id;
        let resolver = HandleResolver::new();
        assert_eq!(hit_test(&graph, &resolver, Point::new(150.0, 40.0), 8.0), Hit::Node(top));
    }

    #[test]
    fn if_gate_exposes_row_handles() {
        let mut graph = FlowGraph::new();
        let gate = graph.add_node(NodeType::IfGate, Point::new(0.0, 0.0)).id;
        let resolver = HandleResolver::new();
        // Row 0 centre is 45 + 20 below the top; out-else is row 1.
        assert_eq!(
            hit_test(&graph, &resolver, Point::new(2.0, 64.0), 8.0),
            Hit::Handle {
                node: gate,
                handle: HandleId::In(0)
            }
        );
        assert_eq!(
            hit_test(&graph, &resolver, Point::new(320.0, 105.0), 8.0),
            Hit::Handle {
                node: gate,
                handle: HandleId::OutElse
            }
        );
    }

    #[test]
    fn covered_handle_loses_to_the_body_above_it() {
        let mut graph = FlowGraph::new();
        let below = graph.add_node(NodeType::Price, Point::new(0.0, 0.0)).id;
        let above = graph.add_node(NodeType::Webhook, Point::new(200.0, 0.0)).id;
        let resolver = HandleResolver::new();
        // `below`'s right handle at (320, 50) sits inside `above`'s body.
        assert_eq!(hit_test(&graph, &resolver, Point::new(320.0, 50.0), 8.0), Hit::Node(above));
        // Its left handle is uncovered.
        assert_eq!(
            hit_test(&graph, &resolver, Point::new(0.0, 50.0), 8.0),
            Hit::Handle {
                node: below,
                handle: HandleId::Left
            }
        );
    }

    #[test]
    fn empty_space_hits_edge_or_canvas() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(NodeType::Price, Point::new(0.0, 0.0)).id;
        let b = graph.add_node(NodeType::Tracking, Point::new(600.0, 0.0)).id;
        let edge = graph.add_edge(Edge::new(a, HandleId::Right, b, HandleId::Left));
        let resolver = HandleResolver::new();
        assert_eq!(hit_test(&graph, &resolver, Point::new(460.0, 50.0), 6.0), Hit::Edge(edge));
        assert_eq!(hit_test(&graph, &resolver, Point::new(460.0, 400.0), 6.0), Hit::Canvas);
    }
}
