//! Schema Graph Analysis
//!
//! Finds the recursive parts of a schema: strongly connected components of
//! the node graph with more than one member, plus nodes that reference
//! themselves. Validation never needs this (it follows edges lazily), but
//! it is what `inspect` and the DOT export report.

use petgraph::algo::kosaraju_scc;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{EdgeKind, NodeId, SchemaGraph};

// =============================================================================
// Cycle
// =============================================================================

/// A strongly connected component (cycle group) in the schema graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    /// Position in the list returned by [`SchemaGraph::cycles`]
    pub id: usize,
    /// Member nodes, sorted
    pub members: Vec<NodeId>,
    /// Edges whose both ends lie in this component
    pub edges: Vec<CycleEdge>,
    /// Single node that references itself
    pub is_self_referential: bool,
}

impl Cycle {
    pub fn contains(&self, id: NodeId) -> bool {
        self.members.binary_search(&id).is_ok()
    }

    /// Named members, in node order
    pub fn names<'g>(&self, graph: &'g SchemaGraph) -> Vec<&'g str> {
        self.members.iter().filter_map(|m| graph.node(*m).name()).collect()
    }
}

/// An edge inside a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleEdge {
    pub from: NodeId,
    pub kind: EdgeKind,
    pub to: NodeId,
}

// =============================================================================
// Analysis Functions
// =============================================================================

impl SchemaGraph {
    /// Recursive components, ordered by their smallest member
    pub fn cycles(&self) -> Vec<Cycle> {
        let mut groups: Vec<Vec<NodeId>> = Vec::new();

        for scc in kosaraju_scc(&self.edges) {
            if scc.len() == 1 {
                let idx = scc[0];
                let has_self_ref = self
                    .edges
                    .edges_directed(idx, Direction::Outgoing)
                    .any(|e| e.target() == idx);
                if !has_self_ref {
                    continue;
                }
            }
            let mut members: Vec<NodeId> = scc
                .iter()
                .filter_map(|idx| self.edges.node_weight(*idx).copied())
                .collect();
            members.sort();
            groups.push(members);
        }

        groups.sort_by_key(|members| members.first().copied());

        groups
            .into_iter()
            .enumerate()
            .map(|(id, members)| {
                let member_set: HashSet<NodeId> = members.iter().copied().collect();
                let edges = self.internal_edges(&member_set);
                Cycle {
                    id,
                    is_self_referential: members.len() == 1,
                    members,
                    edges,
                }
            })
            .collect()
    }

    /// True if `id` can reach itself
    pub fn is_recursive(&self, id: NodeId) -> bool {
        self.cycles().iter().any(|c| c.contains(id))
    }

    fn internal_edges(&self, members: &HashSet<NodeId>) -> Vec<CycleEdge> {
        let mut edges: Vec<CycleEdge> = self
            .edges
            .edge_references()
            .filter_map(|e| {
                let from = *self.edges.node_weight(e.source())?;
                let to = *self.edges.node_weight(e.target())?;
                (members.contains(&from) && members.contains(&to)).then_some(CycleEdge {
                    from,
                    kind: *e.weight(),
                    to,
                })
            })
            .collect();
        edges.sort_by_key(|e| (e.from, e.to));
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_acyclic_graph_has_no_cycles() {
        let graph = SchemaGraph::build(json!({
            "properties": {"a": {"type": "string"}, "b": {"items": {"type": "integer"}}}
        }))
        .unwrap();
        assert!(graph.cycles().is_empty());
        assert!(!graph.is_recursive(graph.root()));
    }

    #[test]
    fn test_self_referential_node() {
        let graph = SchemaGraph::build(json!({"anyOf": [{"type": "null"}, {"$ref": "#"}]})).unwrap();
        let cycles = graph.cycles();
        assert_eq!(cycles.len(), 1);
        // root -> {"$ref": "#"} -> root
        assert_eq!(cycles[0].members.len(), 2);
        assert!(cycles[0].contains(graph.root()));
        assert!(!cycles[0].is_self_referential);
    }

    #[test]
    fn test_direct_self_loop() {
        let graph = SchemaGraph::build(json!({"$ref": "#", "description": "loops"})).unwrap();
        let cycles = graph.cycles();
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].is_self_referential);
        assert_eq!(cycles[0].edges, vec![CycleEdge {
            from: graph.root(),
            kind: EdgeKind::Ref,
            to: graph.root(),
        }]);
    }

    #[test]
    fn test_mutual_recursion_through_definitions() {
        let graph = SchemaGraph::build(json!({
            "$ref": "#/definitions/Expr",
            "definitions": {
                "Expr": {"anyOf": [{"type": "number"}, {"$ref": "#/definitions/Sum"}]},
                "Sum": {"type": "object", "properties": {"terms": {"items": {"$ref": "#/definitions/Expr"}}}}
            }
        }))
        .unwrap();

        let expr = graph.definition("Expr").unwrap();
        let sum = graph.definition("Sum").unwrap();
        let cycles = graph.cycles();
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].contains(expr));
        assert!(cycles[0].contains(sum));
        assert!(!cycles[0].contains(graph.root()));
        assert_eq!(cycles[0].names(&graph), vec!["Expr", "Sum"]);
        assert!(graph.is_recursive(sum));
    }
}
