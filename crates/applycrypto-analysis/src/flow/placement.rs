//! Insertion-point selection along one reverse path.

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::call_graph::traversal::ReversePath;
use crate::call_graph::types::CallGraph;

/// A method and the call inside it that crypto code wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionPoint {
    pub method: NodeIndex,
    /// Edge from `method` toward the query.
    pub call: EdgeIndex,
    /// Levels climbed past a data-access caller.
    pub escalations: usize,
}

/// Pick the insertion point on `path` (root first, query last).
///
/// When the method executing the query is data-access code, its caller is
/// used, climbing further while that caller is itself data-access, at most
/// `max_escalation` times. A query executed from a non-data-access method
/// (a service calling JDBC or `repository.save` directly) is wrapped in that
/// method. With no caller above the executing method, it is used.
pub fn select_insertion_point(graph: &CallGraph, path: &ReversePath, max_escalation: usize) -> Option<InsertionPoint> {
    let len = path.nodes.len();
    if len < 2 || path.edges.len() != len - 1 {
        return None;
    }
    let executing = len - 2;
    let is_data_access = |i: usize| graph.method(path.nodes[i]).is_some_and(|m| m.layer.is_data_access());

    if !is_data_access(executing) || executing == 0 {
        return Some(InsertionPoint {
            method: path.nodes[executing],
            call: path.edges[executing],
            escalations: 0,
        });
    }

    let mut at = executing - 1;
    let mut escalations = 0;
    while is_data_access(at) && escalations < max_escalation && at > 0 {
        at -= 1;
        escalations += 1;
    }
    Some(InsertionPoint {
        method: path.nodes[at],
        call: path.edges[at],
        escalations,
    })
}
