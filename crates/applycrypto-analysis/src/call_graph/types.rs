//! Call graph types: tagged-variant nodes, call edges, build stats.

use std::collections::BTreeMap;

use applycrypto_core::errors::CallGraphError;
use applycrypto_core::types::collections::FxHashMap;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::columns::types::ResolvedQuery;
use crate::entry_points::Trigger;
use crate::parsers::types::{MethodInfo, ParameterInfo, Range};

use super::boundary::BoundaryKind;
use super::layers::Layer;

/// Method identity: `pkg.Class.method(T1,T2)`.
pub fn method_id(class: &str, method: &MethodInfo) -> String {
    format!("{}.{}{}", class, method.name, method.signature())
}

/// The merged graph of methods, queries and external call targets.
pub struct CallGraph {
    pub graph: StableGraph<GraphNode, CallEdge, Directed>,
    ids: FxHashMap<String, NodeIndex>,
    file_nodes: FxHashMap<String, Vec<NodeIndex>>,
}

/// A neighbour reached over one edge.
#[derive(Debug, Clone, Copy)]
pub struct Adjacent<'a> {
    pub node: NodeIndex,
    pub edge: EdgeIndex,
    pub call: &'a CallEdge,
}

impl CallGraph {
    pub fn new() -> Self {
        Self {
            graph: StableGraph::new(),
            ids: FxHashMap::default(),
            file_nodes: FxHashMap::default(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Add a node, returning the existing index when the identity is taken.
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&existing) = self.ids.get(node.id()) {
            return existing;
        }
        let id = node.id().to_string();
        let file = node.file().map(str::to_string);
        let idx = self.graph.add_node(node);
        self.ids.insert(id, idx);
        if let Some(file) = file {
            self.file_nodes.entry(file).or_default().push(idx);
        }
        idx
    }

    /// Add a call edge. Parallel edges between one pair are kept distinct.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, edge: CallEdge) -> EdgeIndex {
        self.graph.add_edge(from, to, edge)
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.ids.get(id).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&GraphNode> {
        self.graph.node_weight(idx)
    }

    /// Identity of a node, empty for a stale index.
    pub fn id(&self, idx: NodeIndex) -> &str {
        self.node(idx).map(GraphNode::id).unwrap_or_default()
    }

    pub fn method(&self, idx: NodeIndex) -> Option<&MethodNode> {
        self.node(idx).and_then(GraphNode::as_method)
    }

    /// Look up a query node by id.
    pub fn query(&self, id: &str) -> Result<(NodeIndex, &QueryNode), CallGraphError> {
        let idx = self
            .node_index(id)
            .ok_or_else(|| CallGraphError::UnknownNode { id: id.to_string() })?;
        match self.node(idx).and_then(GraphNode::as_query) {
            Some(q) => Ok((idx, q)),
            None => Err(CallGraphError::NotAQuery { id: id.to_string() }),
        }
    }

    pub fn edge(&self, idx: EdgeIndex) -> Option<&CallEdge> {
        self.graph.edge_weight(idx)
    }

    /// Nodes declared in one file, in insertion order.
    pub fn file_nodes(&self, file: &str) -> &[NodeIndex] {
        self.file_nodes.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Incoming edges, ordered by caller identity then call-site position.
    pub fn callers(&self, idx: NodeIndex) -> Vec<Adjacent<'_>> {
        let mut out: Vec<Adjacent<'_>> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| Adjacent {
                node: e.source(),
                edge: e.id(),
                call: e.weight(),
            })
            .collect();
        out.sort_by(|a, b| {
            (self.id(a.node), a.call.line, a.call.column).cmp(&(self.id(b.node), b.call.line, b.call.column))
        });
        out
    }

    /// Outgoing edges, ordered by call-site position then callee identity.
    pub fn callees(&self, idx: NodeIndex) -> Vec<Adjacent<'_>> {
        let mut out: Vec<Adjacent<'_>> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| Adjacent {
                node: e.target(),
                edge: e.id(),
                call: e.weight(),
            })
            .collect();
        out.sort_by(|a, b| {
            (a.call.line, a.call.column, self.id(a.node)).cmp(&(b.call.line, b.call.column, self.id(b.node)))
        });
        out
    }

    /// Query nodes in insertion order.
    pub fn queries(&self) -> impl Iterator<Item = (NodeIndex, &QueryNode)> {
        self.graph
            .node_indices()
            .filter_map(move |idx| self.graph[idx].as_query().map(|q| (idx, q)))
    }

    /// Entry-point method nodes in insertion order.
    pub fn entry_points(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph[idx].is_entry_point())
            .collect()
    }
}

impl Default for CallGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// A graph node: a method declaration, a query, or an unresolved call target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum GraphNode {
    Method(MethodNode),
    Query(QueryNode),
    External(ExternalNode),
}

impl GraphNode {
    pub fn id(&self) -> &str {
        match self {
            Self::Method(m) => &m.id,
            Self::Query(q) => q.query.id(),
            Self::External(e) => &e.id,
        }
    }

    pub fn file(&self) -> Option<&str> {
        match self {
            Self::Method(m) => Some(&m.file),
            Self::Query(q) => Some(&q.query.declaration.file),
            Self::External(_) => None,
        }
    }

    pub fn as_method(&self) -> Option<&MethodNode> {
        match self {
            Self::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_query(&self) -> Option<&QueryNode> {
        match self {
            Self::Query(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_external(&self) -> Option<&ExternalNode> {
        match self {
            Self::External(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_entry_point(&self) -> bool {
        self.as_method().is_some_and(|m| m.entry_point.is_some())
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Method(_) => "method",
            Self::Query(_) => "query",
            Self::External(_) => "external",
        }
    }
}

/// A method or constructor declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodNode {
    pub id: String,
    /// Qualified declaring class.
    pub class: String,
    pub name: String,
    pub signature: String,
    pub file: String,
    pub range: Range,
    /// Raw annotation names.
    pub annotations: Vec<String>,
    pub parameters: SmallVec<[ParameterInfo; 4]>,
    pub return_type: Option<String>,
    pub layer: Layer,
    pub entry_point: Option<Trigger>,
    /// Declared without a body (interface or abstract).
    pub is_abstract: bool,
}

impl MethodNode {
    /// `Class.method` without package, for readable placements.
    pub fn short_name(&self) -> String {
        let class = self.class.rsplit('.').next().unwrap_or(&self.class);
        format!("{}.{}", class, self.name)
    }
}

/// A resolved (or resolution-failed) query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryNode {
    pub query: ResolvedQuery,
}

/// Target of a call that resolved to no declaration in the sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalNode {
    pub id: String,
    /// `receiver.method` as written at the first call site.
    pub text: String,
    pub boundary: Option<BoundaryKind>,
}

impl ExternalNode {
    pub fn external_id(text: &str) -> String {
        format!("external:{text}")
    }
}

/// What an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Method → method.
    Invokes,
    /// Method → query.
    Executes,
    /// Method → external call target.
    External,
}

/// One argument expression bound to a callee parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundArgument {
    pub expression: String,
    pub parameter: String,
}

/// Caller expression → callee parameter map for one call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "binding", rename_all = "snake_case")]
pub enum ArgumentBinding {
    Resolved { arguments: Vec<BoundArgument> },
    Unresolved,
}

impl ArgumentBinding {
    /// Bind arguments positionally; a count mismatch leaves the binding unresolved.
    pub fn positional(arguments: &[String], parameters: &[String]) -> Self {
        if arguments.len() != parameters.len() {
            return Self::Unresolved;
        }
        Self::Resolved {
            arguments: arguments
                .iter()
                .zip(parameters)
                .map(|(e, p)| BoundArgument {
                    expression: e.clone(),
                    parameter: p.clone(),
                })
                .collect(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    /// Caller expressions, in parameter order.
    pub fn expressions(&self) -> impl Iterator<Item = &str> {
        let args: &[BoundArgument] = match self {
            Self::Resolved { arguments } => arguments,
            Self::Unresolved => &[],
        };
        args.iter().map(|a| a.expression.as_str())
    }
}

/// How a call site was bound to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Unqualified call or `this.m()` within the declaring class or its supertypes.
    SameClass,
    /// Receiver variable whose declared type is a known class.
    ReceiverType,
    /// `Type.method()` static call.
    StaticType,
    /// Interface receiver bound to its implementing class.
    Implementation,
    /// A statement id passed to a `SqlSession`-style API.
    StatementId,
    /// A mapper interface method whose class names a mapper namespace.
    MapperMethod,
    /// SQL built in the method body and executed there.
    EmbeddedSql,
    /// A repository method declaring or deriving its query.
    RepositoryMethod,
    /// An operation a repository inherits from its framework base.
    InheritedOperation,
}

impl Resolution {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SameClass => "same_class",
            Self::ReceiverType => "receiver_type",
            Self::StaticType => "static_type",
            Self::Implementation => "implementation",
            Self::StatementId => "statement_id",
            Self::MapperMethod => "mapper_method",
            Self::EmbeddedSql => "embedded_sql",
            Self::RepositoryMethod => "repository_method",
            Self::InheritedOperation => "inherited_operation",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A directed call relation with its call-site facts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallEdge {
    pub kind: EdgeKind,
    /// `receiver.method` text at the call site.
    pub call_text: String,
    pub line: u32,
    pub column: u32,
    pub binding: ArgumentBinding,
    /// `None` for edges to external nodes.
    pub resolution: Option<Resolution>,
    /// Overload picked by lexical order after count and type matching tied.
    pub ambiguous: bool,
    /// Variable receiving the call result.
    pub assigned_to: Option<String>,
    pub is_returned: bool,
    /// Position of the call in the same method that consumes this result
    /// as an argument.
    pub argument_of: Option<(u32, u32)>,
    pub arguments: SmallVec<[String; 4]>,
}

/// Statistics from one graph build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallGraphStats {
    pub methods: usize,
    pub queries: usize,
    pub externals: usize,
    pub edges: usize,
    pub entry_points: usize,
    pub call_sites: usize,
    pub resolved_calls: usize,
    pub unresolved_calls: usize,
    pub ambiguous_calls: usize,
    /// Queries no method executes.
    pub dead_queries: usize,
    pub resolution_counts: BTreeMap<String, usize>,
    pub resolution_rate: f64,
    /// Wall time; left out of serialized reports so reruns compare equal.
    #[serde(skip)]
    pub build_ms: u64,
}
