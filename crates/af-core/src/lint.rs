//! Lint diagnostics for automation graphs.
//!
//! Reports structural smells without modifying the graph and without ever
//! blocking a save. The save gate only enforces `validate_structure`.

use crate::data::Category;
use crate::handle::HandleId;
use crate::id::NodeId;
use crate::model::FlowGraph;
use petgraph::visit::Dfs;
use std::collections::HashSet;

// ─── Diagnostic types ────────────────────────────────────────────────────

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    /// Probably not what the author meant.
    Warning,
    Info,
}

/// A single lint diagnostic for a block.
#[derive(Debug, Clone)]
pub struct LintDiagnostic {
    pub node_id: NodeId,
    pub message: String,
    pub severity: LintSeverity,
    /// Short rule identifier (e.g. "unreachable-action").
    pub rule: &'static str,
}

// ─── Public API ──────────────────────────────────────────────────────────

/// Run all lint rules over the graph and return diagnostics.
#[must_use]
pub fn lint_graph(graph: &FlowGraph) -> Vec<LintDiagnostic> {
    let mut diags = Vec::new();
    lint_unreachable_actions(graph, &mut diags);
    lint_isolated_nodes(graph, &mut diags);
    lint_unwired_branches(graph, &mut diags);
    lint_unknown_types(graph, &mut diags);
    diags
}

// ─── Rules ───────────────────────────────────────────────────────────────

/// Warn on Action blocks that no Conditional block can reach.
fn lint_unreachable_actions(graph: &FlowGraph, diags: &mut Vec<LintDiagnostic>) {
    let (dg, index) = graph.to_digraph();
    let mut reached = HashSet::new();
    for node in graph.nodes.iter().filter(|n| n.category() == Some(Category::Conditional)) {
        let Some(&start) = index.get(&node.id) else {
            continue;
        };
        let mut dfs = Dfs::new(&dg, start);
        while let Some(ix) = dfs.next(&dg) {
            reached.insert(dg[ix]);
        }
    }
    for node in graph.nodes.iter().filter(|n| n.category() == Some(Category::Action)) {
        if !reached.contains(&node.id) {
            diags.push(LintDiagnostic {
                node_id: node.id,
                message: format!(
                    "`{}` block {} is not reachable from any Conditional block and will never fire.",
                    node.type_name(),
                    node.id
                ),
                severity: LintSeverity::Warning,
                rule: "unreachable-action",
            });
        }
    }
}

/// Info on blocks with no connections at all.
fn lint_isolated_nodes(graph: &FlowGraph, diags: &mut Vec<LintDiagnostic>) {
    for node in &graph.nodes {
        if graph.edges_of(node.id).next().is_none() {
            diags.push(LintDiagnostic {
                node_id: node.id,
                message: format!("`{}` block {} has no connections.", node.type_name(), node.id),
                severity: LintSeverity::Info,
                rule: "isolated-node",
            });
        }
    }
}

/// Info on `if_gate` output rows that lead nowhere.
fn lint_unwired_branches(graph: &FlowGraph, diags: &mut Vec<LintDiagnostic>) {
    for node in &graph.nodes {
        let Some(rows) = node.data.condition_count() else {
            continue;
        };
        let wired: HashSet<&HandleId> = graph
            .edges
            .iter()
            .filter(|e| e.source == node.id)
            .map(|e| &e.source_handle)
            .collect();
        let outputs = (0..rows)
            .map(HandleId::Out)
            .chain(std::iter::once(HandleId::OutElse));
        for handle in outputs {
            if !wired.contains(&handle) {
                diags.push(LintDiagnostic {
                    node_id: node.id,
                    message: format!("Branch `{handle}` of if_gate {} is not connected.", node.id),
                    severity: LintSeverity::Info,
                    rule: "unwired-branch",
                });
            }
        }
    }
}

/// Info on blocks preserved from a newer schema.
fn lint_unknown_types(graph: &FlowGraph, diags: &mut Vec<LintDiagnostic>) {
    for node in &graph.nodes {
        if node.node_type().is_none() {
            diags.push(LintDiagnostic {
                node_id: node.id,
                message: format!(
                    "Block {} has unrecognized type `{}`; it is kept as-is.",
                    node.id,
                    node.type_name()
                ),
                severity: LintSeverity::Info,
                rule: "unknown-type",
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{NodeData, NodeType};
    use crate::model::{Edge, Point};

    fn rules(diags: &[LintDiagnostic]) -> Vec<&'static str> {
        diags.iter().map(|d| d.rule).collect()
    }

    #[test]
    fn reachable_chain_is_clean() {
        let mut graph = FlowGraph::new();
        let p = graph.add_node(NodeType::Price, Point::default()).id;
        let g = graph.add_node(NodeType::LogicGate, Point::default()).id;
        let t = graph.add_node(NodeType::Tracking, Point::default()).id;
        graph.add_edge(Edge::new(p, HandleId::Right, g, HandleId::Left));
        graph.add_edge(Edge::new(g, HandleId::Right, t, HandleId::Left));
        assert!(lint_graph(&graph).is_empty());
    }

    #[test]
    fn action_fed_only_by_info_is_unreachable() {
        let mut graph = FlowGraph::new();
        let p = graph.add_node(NodeType::Risk, Point::default()).id;
        let i = graph.add_node(NodeType::EmailInfo, Point::default()).id;
        let a = graph.add_node(NodeType::SendEmail, Point::default()).id;
        let b = graph.add_node(NodeType::Webhook, Point::default()).id;
        graph.add_edge(Edge::new(i, HandleId::Right, a, HandleId::Left));
        graph.add_edge(Edge::new(p, HandleId::Right, b, HandleId::Left));

        let diags = lint_graph(&graph);
        let unreachable: Vec<_> = diags
            .iter()
            .filter(|d| d.rule == "unreachable-action")
            .map(|d| d.node_id)
            .collect();
        assert_eq!(unreachable, vec![a]);
        assert_eq!(diags.iter().find(|d| d.node_id == a).map(|d| d.severity), Some(LintSeverity::Warning));
    }

    #[test]
    fn if_gate_reports_each_open_branch() {
        let mut graph = FlowGraph::new();
        let gate = graph.add_node(NodeType::IfGate, Point::default()).id;
        let t = graph.add_node(NodeType::Tracking, Point::default()).id;
        graph.add_edge(Edge::new(gate, HandleId::Out(0), t, HandleId::Left));
        let diags = lint_graph(&graph);
        let branches: Vec<_> = diags.iter().filter(|d| d.rule == "unwired-branch").collect();
        assert_eq!(branches.len(), 1);
        assert!(branches[0].message.contains("out-else"));
    }

    #[test]
    fn isolated_and_unknown_blocks_are_info() {
        let mut graph = FlowGraph::new();
        let mut node = graph.add_node(NodeType::Nexus, Point::default());
        node.data = NodeData::Unknown {
            type_name: "options_chain".into(),
            data: serde_json::json!({}),
        };
        graph.insert_node(node);
        let diags = lint_graph(&graph);
        assert_eq!(rules(&diags), vec!["isolated-node", "unknown-type"]);
        assert!(diags.iter().all(|d| d.severity == LintSeverity::Info));
    }
}
