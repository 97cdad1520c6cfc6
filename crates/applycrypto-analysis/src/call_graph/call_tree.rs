//! Forward call trees rooted at entry points, for reporting.

use applycrypto_core::types::collections::FxHashSet;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

use super::types::{CallGraph, GraphNode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallTreeNode {
    pub id: String,
    pub kind: String,
    /// Call-site line in the parent; `None` at the root.
    pub line: Option<u32>,
    /// Already on the path from the root.
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub recursive: bool,
    /// Depth cap reached below this node.
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub truncated: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<CallTreeNode>,
}

/// One tree per entry point. External calls appear only when they are
/// boundary APIs.
pub fn call_trees(graph: &CallGraph, max_depth: usize) -> Vec<CallTreeNode> {
    let mut roots = graph.entry_points();
    roots.sort_by(|a, b| graph.id(*a).cmp(graph.id(*b)));
    roots
        .into_iter()
        .map(|root| {
            let mut on_path = FxHashSet::default();
            expand(graph, root, None, 0, max_depth, &mut on_path)
        })
        .collect()
}

fn expand(
    graph: &CallGraph,
    node: NodeIndex,
    line: Option<u32>,
    depth: usize,
    max_depth: usize,
    on_path: &mut FxHashSet<NodeIndex>,
) -> CallTreeNode {
    let mut tree = CallTreeNode {
        id: graph.id(node).to_string(),
        kind: graph.node(node).map(GraphNode::kind_name).unwrap_or("unknown").to_string(),
        line,
        recursive: false,
        truncated: false,
        children: Vec::new(),
    };
    if !on_path.insert(node) {
        tree.recursive = true;
        return tree;
    }
    let callees = graph.callees(node);
    if depth >= max_depth {
        tree.truncated = !callees.is_empty();
    } else {
        for callee in callees {
            let shown = match graph.node(callee.node) {
                Some(GraphNode::External(e)) => e.boundary.is_some(),
                Some(_) => true,
                None => false,
            };
            if shown {
                tree.children
                    .push(expand(graph, callee.node, Some(callee.call.line), depth + 1, max_depth, on_path));
            }
        }
    }
    on_path.remove(&node);
    tree
}
