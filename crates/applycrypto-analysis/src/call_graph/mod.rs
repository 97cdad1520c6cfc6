//! Call Graph Builder: one petgraph `StableGraph` holding methods, queries
//! and external call targets, with bounded traversals over it.

pub mod boundary;
pub mod builder;
pub mod call_tree;
pub mod layers;
pub mod namespace;
pub mod resolution;
pub mod traversal;
pub mod types;

pub use boundary::{BoundaryKind, BoundaryMatcher};
pub use builder::CallGraphBuilder;
pub use call_tree::{call_trees, CallTreeNode};
pub use layers::Layer;
pub use traversal::{bfs_forward, bfs_inverse, enumerate_reverse_paths, PathOrigin, ReversePath, TraversalLimits};
pub use types::{
    ArgumentBinding, CallEdge, CallGraph, CallGraphStats, EdgeKind, ExternalNode, GraphNode, MethodNode, QueryNode,
    Resolution,
};
