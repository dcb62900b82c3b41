//! Connection rules and pre-save structural checks.
//!
//! These are the rules the execution engine relies on, so the editor must
//! agree with it on what is legal:
//!
//! | Source      | May connect to    |
//! |-------------|-------------------|
//! | Conditional | Action, Logic     |
//! | Logic       | Action, Logic     |
//! | Info        | Action            |
//! | Action      | nothing           |

use crate::data::{Category, NodeType};
use crate::error::{ConnectionError, StructureError};
use crate::geometry::has_handle;
use crate::handle::HandleId;
use crate::id::NodeId;
use crate::model::FlowGraph;

/// Outcome of a connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Create the edge.
    Allow,
    /// Source and target are the same node: drop the attempt, no message.
    Ignore,
    Reject(ConnectionError),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Category table for an ordered `(source, target)` pair of block types.
pub fn category_rule(from: NodeType, to: NodeType) -> Result<(), ConnectionError> {
    let names = || (from.as_str().to_string(), to.as_str().to_string());
    match (from.category(), to.category()) {
        (Category::Action, _) => Err(ConnectionError::ActionSource),
        (Category::Conditional, Category::Action | Category::Logic) => Ok(()),
        (Category::Conditional, _) => {
            let (from, to) = names();
            Err(ConnectionError::ConditionalTarget { from, to })
        }
        (Category::Logic, Category::Action | Category::Logic) => Ok(()),
        (Category::Logic, _) => {
            let (from, to) = names();
            Err(ConnectionError::LogicTarget { from, to })
        }
        (Category::Info, Category::Action) => Ok(()),
        (Category::Info, _) => {
            let (from, to) = names();
            Err(ConnectionError::InfoTarget { from, to })
        }
    }
}

/// Decide whether `from.from_handle → to.to_handle` may be added to `graph`.
///
/// Besides the category table, this rejects handles the nodes do not render
/// (a row index past the last condition, or row handles on fixed-shape
/// blocks), row handles used against their direction, and blocks whose type
/// this build does not recognize.
pub fn check_connection(
    graph: &FlowGraph,
    from: NodeId,
    from_handle: &HandleId,
    to: NodeId,
    to_handle: &HandleId,
) -> Verdict {
    if from == to {
        return Verdict::Ignore;
    }
    let Some(source) = graph.node(from) else {
        return Verdict::Reject(ConnectionError::MissingNode(from.to_string()));
    };
    let Some(target) = graph.node(to) else {
        return Verdict::Reject(ConnectionError::MissingNode(to.to_string()));
    };
    let Some(source_type) = source.node_type() else {
        return Verdict::Reject(ConnectionError::UnknownType(source.type_name().to_string()));
    };
    let Some(target_type) = target.node_type() else {
        return Verdict::Reject(ConnectionError::UnknownType(target.type_name().to_string()));
    };
    if let Err(e) = category_rule(source_type, target_type) {
        log::debug!("reject {source_type} → {target_type}: {e}");
        return Verdict::Reject(e);
    }
    for (node, handle) in [(source, from_handle), (target, to_handle)] {
        if !has_handle(node, handle) {
            return Verdict::Reject(ConnectionError::MissingHandle {
                node_type: node.type_name().to_string(),
                handle: handle.to_string(),
            });
        }
    }
    if from_handle.is_input() {
        return Verdict::Reject(ConnectionError::InputAsSource(from_handle.to_string()));
    }
    if to_handle.is_output() {
        return Verdict::Reject(ConnectionError::OutputAsTarget(to_handle.to_string()));
    }
    Verdict::Allow
}

/// Structural checks run before any save.
///
/// Requires at least one Conditional and one Action block, and that every
/// edge joins two distinct, existing blocks. Connectivity is
/// not checked here; `lint` reports unreachable actions.
pub fn validate_structure(graph: &FlowGraph) -> Result<(), StructureError> {
    if !graph.has_category(Category::Conditional) {
        return Err(StructureError::MissingConditional);
    }
    if !graph.has_category(Category::Action) {
        return Err(StructureError::MissingAction);
    }
    for (index, edge) in graph.edges.iter().enumerate() {
        for end in [edge.source, edge.target] {
            if !graph.contains(end) {
                return Err(StructureError::DanglingEdge {
                    index,
                    node_id: end.to_string(),
                });
            }
        }
        if edge.source == edge.target {
            return Err(StructureError::SelfLoop {
                index,
                node_id: edge.source.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, Point};

    #[test]
    fn conditional_may_feed_logic_and_action_only() {
        assert!(category_rule(NodeType::Price, NodeType::LogicGate).is_ok());
        assert!(category_rule(NodeType::Price, NodeType::Webhook).is_ok());
        assert_eq!(
            category_rule(NodeType::Price, NodeType::EmailInfo),
            Err(ConnectionError::ConditionalTarget {
                from: "price".into(),
                to: "email_info".into()
            })
        );
    }

    #[test]
    fn self_loop_is_ignored_even_for_actions() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(NodeType::Tracking, Point::default()).id;
        assert_eq!(
            check_connection(&graph, a, &HandleId::Right, a, &HandleId::Left),
            Verdict::Ignore
        );
    }

    #[test]
    fn out_of_range_row_is_rejected() {
        let mut graph = FlowGraph::new();
        let gate = graph.add_node(NodeType::IfGate, Point::default()).id;
        let act = graph.add_node(NodeType::Nexus, Point::default()).id;
        assert_eq!(
            check_connection(&graph, gate, &HandleId::Out(0), act, &HandleId::Left),
            Verdict::Allow
        );
        assert_eq!(
            check_connection(&graph, gate, &HandleId::Out(5), act, &HandleId::Left),
            Verdict::Reject(ConnectionError::MissingHandle {
                node_type: "if_gate".into(),
                handle: "out-5".into()
            })
        );
    }

    #[test]
    fn row_handles_keep_their_direction() {
        let mut graph = FlowGraph::new();
        let price = graph.add_node(NodeType::Price, Point::default()).id;
        let gate = graph.add_node(NodeType::IfGate, Point::default()).id;
        let act = graph.add_node(NodeType::Tracking, Point::default()).id;
        assert_eq!(
            check_connection(&graph, price, &HandleId::Right, gate, &HandleId::In(0)),
            Verdict::Allow
        );
        assert_eq!(
            check_connection(&graph, gate, &HandleId::In(0), act, &HandleId::Left),
            Verdict::Reject(ConnectionError::InputAsSource("in-0".into()))
        );
        assert_eq!(
            check_connection(&graph, price, &HandleId::Right, gate, &HandleId::OutElse),
            Verdict::Reject(ConnectionError::OutputAsTarget("out-else".into()))
        );
    }

    #[test]
    fn unknown_type_cannot_connect() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(NodeType::Price, Point::default()).id;
        let mut odd = graph.add_node(NodeType::Tracking, Point::default());
        odd.data = crate::data::NodeData::Unknown {
            type_name: "teleport".into(),
            data: serde_json::Value::Null,
        };
        let odd_id = odd.id;
        graph.insert_node(odd);
        assert_eq!(
            check_connection(&graph, a, &HandleId::Right, odd_id, &HandleId::Left),
            Verdict::Reject(ConnectionError::UnknownType("teleport".into()))
        );
    }

    #[test]
    fn structure_requires_conditional_then_action() {
        let mut graph = FlowGraph::new();
        graph.add_node(NodeType::Tracking, Point::default());
        graph.add_node(NodeType::Webhook, Point::default());
        assert_eq!(validate_structure(&graph), Err(StructureError::MissingConditional));

        let mut graph = FlowGraph::new();
        graph.add_node(NodeType::Risk, Point::default());
        assert_eq!(validate_structure(&graph), Err(StructureError::MissingAction));

        graph.add_node(NodeType::SendEmail, Point::default());
        assert_eq!(validate_structure(&graph), Ok(()));
    }

    #[test]
    fn structure_accepts_disconnected_graphs() {
        let mut graph = FlowGraph::new();
        graph.add_node(NodeType::Percentage, Point::default());
        graph.add_node(NodeType::Tracking, Point::default());
        assert!(graph.edges.is_empty());
        assert_eq!(validate_structure(&graph), Ok(()));
    }

    #[test]
    fn structure_rejects_dangling_edge() {
        let mut graph = FlowGraph::new();
        let a = graph.add_node(NodeType::Price, Point::default()).id;
        graph.add_node(NodeType::Tracking, Point::default());
        graph.add_edge(Edge::new(a, HandleId::Right, NodeId::intern("gone"), HandleId::Left));
        assert_eq!(
            validate_structure(&graph),
            Err(StructureError::DanglingEdge {
                index: 0,
                node_id: "gone".into()
            })
        );
    }
}
