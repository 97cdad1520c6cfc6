//! Graph traversal: bounded reverse path enumeration for flow analysis and
//! plain forward/inverse BFS.

use std::collections::VecDeque;

use applycrypto_core::config::AnalysisConfig;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::{VisitMap, Visitable};
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use super::boundary::BoundaryKind;
use super::types::{CallEdge, CallGraph, EdgeKind};

/// Caps applied to one reverse traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalLimits {
    /// Maximum edges on a path.
    pub max_depth: usize,
    /// Callers expanded per node.
    ///
    /// Callers past the cap are not walked, so their paths are missing from
    /// the result. The query's flows then carry `TruncatedTraversal` and a
    /// warning names the node; raise the cap to enumerate them all.
    pub max_fan_out: usize,
    /// Paths enumerated before the traversal stops.
    pub max_paths: usize,
}

impl TraversalLimits {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            max_depth: config.effective_max_depth(),
            max_fan_out: config.effective_max_fan_out(),
            max_paths: config.effective_max_paths_per_query(),
        }
    }
}

impl Default for TraversalLimits {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

/// Why a reverse path stopped where it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum PathOrigin {
    /// The root is an entry point.
    EntryPoint,
    /// The root reads the session before its call toward the query.
    SessionRead { call_text: String, line: u32 },
    /// The root calls an outbound client before its call toward the query.
    OutboundClient { call_text: String, line: u32 },
    /// The root has no callers and is not an entry point.
    Orphan,
    /// The depth cap cut the path.
    DepthLimit,
}

impl PathOrigin {
    /// Rooted at an entry point or a boundary node.
    pub fn is_rooted(&self) -> bool {
        matches!(self, Self::EntryPoint | Self::SessionRead { .. } | Self::OutboundClient { .. })
    }
}

/// One root-to-query path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversePath {
    /// Root first, query last.
    pub nodes: Vec<NodeIndex>,
    /// `edges[i]` runs from `nodes[i]` to `nodes[i + 1]`.
    pub edges: Vec<EdgeIndex>,
    pub origin: PathOrigin,
}

impl ReversePath {
    pub fn root(&self) -> NodeIndex {
        self.nodes[0]
    }

    /// Node identities, root first.
    pub fn ids(&self, graph: &CallGraph) -> Vec<String> {
        self.nodes.iter().map(|&n| graph.id(n).to_string()).collect()
    }
}

/// Every path found for one query.
#[derive(Debug, Clone, Default)]
pub struct ReversePaths {
    pub paths: Vec<ReversePath>,
    /// The path cap stopped enumeration.
    pub truncated: bool,
    /// Some node had more callers than the fan-out cap.
    pub fan_out_capped: bool,
}

/// Enumerate root-to-`target` paths by walking callers.
///
/// A path stops at the first method (nearest the target) that reads the
/// session or calls an outbound client before its call toward the target,
/// at an entry point, at a method with no callers, or at the depth cap.
/// A caller already on the current path is skipped, so recursion yields
/// each path once.
pub fn enumerate_reverse_paths(graph: &CallGraph, target: NodeIndex, limits: TraversalLimits) -> ReversePaths {
    let mut walker = ReverseWalker {
        graph,
        limits,
        on_path: graph.graph.visit_map(),
        nodes: vec![target],
        edges: Vec::new(),
        out: ReversePaths::default(),
    };
    walker.on_path.visit(target);
    walker.walk(target);
    if walker.out.truncated {
        tracing::warn!(
            target = %graph.id(target),
            max_paths = limits.max_paths,
            "reverse path enumeration truncated"
        );
    }
    walker.out
}

struct ReverseWalker<'g, M> {
    graph: &'g CallGraph,
    limits: TraversalLimits,
    /// Nodes on the current path; cleared again on backtrack.
    on_path: M,
    /// Current path, target first.
    nodes: Vec<NodeIndex>,
    edges: Vec<EdgeIndex>,
    out: ReversePaths,
}

impl<M: VisitMap<NodeIndex>> ReverseWalker<'_, M> {
    fn walk(&mut self, node: NodeIndex) {
        if self.out.paths.len() >= self.limits.max_paths {
            self.out.truncated = true;
            return;
        }

        // Boundary and entry checks apply to methods reached over an edge.
        if let Some(&toward_target) = self.edges.last() {
            if let Some(call) = self.graph.edge(toward_target) {
                if let Some((kind, text, line)) = boundary_before(self.graph, node, call) {
                    let origin = match kind {
                        BoundaryKind::OutboundClient => PathOrigin::OutboundClient { call_text: text, line },
                        _ => PathOrigin::SessionRead { call_text: text, line },
                    };
                    self.emit(origin);
                    return;
                }
            }
            if self.graph.node(node).is_some_and(|n| n.is_entry_point()) {
                self.emit(PathOrigin::EntryPoint);
                return;
            }
        }

        if self.edges.len() >= self.limits.max_depth {
            self.emit(PathOrigin::DepthLimit);
            return;
        }

        let callers = self.graph.callers(node);
        if callers.len() > self.limits.max_fan_out {
            self.out.fan_out_capped = true;
            tracing::warn!(
                node = %self.graph.id(node),
                callers = callers.len(),
                max_fan_out = self.limits.max_fan_out,
                "caller fan-out capped"
            );
        }
        let mut expanded = 0usize;
        for caller in callers.into_iter().take(self.limits.max_fan_out) {
            if self.on_path.is_visited(&caller.node) {
                continue;
            }
            expanded += 1;
            self.on_path.visit(caller.node);
            self.nodes.push(caller.node);
            self.edges.push(caller.edge);
            self.walk(caller.node);
            self.edges.pop();
            self.nodes.pop();
            self.on_path.unvisit(caller.node);
        }
        if expanded == 0 && !self.edges.is_empty() {
            self.emit(PathOrigin::Orphan);
        }
    }

    fn emit(&mut self, origin: PathOrigin) {
        if self.out.paths.len() >= self.limits.max_paths {
            self.out.truncated = true;
            return;
        }
        let mut nodes = self.nodes.clone();
        nodes.reverse();
        let mut edges = self.edges.clone();
        edges.reverse();
        self.out.paths.push(ReversePath { nodes, edges, origin });
    }
}

/// Session read (checked first) or outbound call made by `method` at or
/// before `toward_target`, excluding that call itself.
pub fn boundary_before(graph: &CallGraph, method: NodeIndex, toward_target: &CallEdge) -> Option<(BoundaryKind, String, u32)> {
    let position = (toward_target.line, toward_target.column);
    let hits: Vec<(BoundaryKind, &CallEdge)> = graph
        .callees(method)
        .into_iter()
        .filter(|a| a.call.kind == EdgeKind::External && a.call.line <= toward_target.line)
        .filter(|a| (a.call.line, a.call.column) != position)
        .filter_map(|a| {
            let kind = graph.node(a.node)?.as_external()?.boundary?;
            Some((kind, a.call))
        })
        .collect();
    [BoundaryKind::SessionRead, BoundaryKind::OutboundClient]
        .into_iter()
        .find_map(|wanted| {
            hits.iter()
                .rev()
                .find(|(kind, _)| *kind == wanted)
                .map(|(kind, call)| (*kind, call.call_text.clone(), call.line))
        })
}

/// Forward BFS: every node reachable from `start`.
pub fn bfs_forward(graph: &CallGraph, start: NodeIndex, max_depth: Option<usize>) -> Vec<NodeIndex> {
    bfs_directed(graph, start, Direction::Outgoing, max_depth)
}

/// Inverse BFS: every node that can reach `start`.
pub fn bfs_inverse(graph: &CallGraph, start: NodeIndex, max_depth: Option<usize>) -> Vec<NodeIndex> {
    bfs_directed(graph, start, Direction::Incoming, max_depth)
}

fn bfs_directed(graph: &CallGraph, start: NodeIndex, direction: Direction, max_depth: Option<usize>) -> Vec<NodeIndex> {
    let mut visited = graph.graph.visit_map();
    let mut queue = VecDeque::new();
    let mut result = Vec::new();

    visited.visit(start);
    queue.push_back((start, 0usize));

    while let Some((node, depth)) = queue.pop_front() {
        if node != start {
            result.push(node);
        }
        if max_depth.is_some_and(|max| depth >= max) {
            continue;
        }
        for neighbor in graph.graph.neighbors_directed(node, direction) {
            if visited.visit(neighbor) {
                queue.push_back((neighbor, depth + 1));
            }
        }
    }

    result
}
