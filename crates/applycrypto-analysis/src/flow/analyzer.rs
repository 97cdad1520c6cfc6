//! Per-query flow analysis: classify each reverse path's source and sink,
//! decide the crypto legs, place them, and collapse equivalent paths.

use applycrypto_core::config::AnalysisConfig;
use applycrypto_core::errors::{CallGraphError, ResolutionFailure};
use applycrypto_core::FxHashMap;
use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use tracing::{debug, info};

use super::placement::{select_insertion_point, InsertionPoint};
use super::policy::{combine, decide};
use super::types::{
    CryptoAction, FlowFlag, FlowRecord, FlowStatus, InsertionPosition, Placement, SinkKind, SourceKind, TargetColumn,
};
use crate::call_graph::boundary::BoundaryKind;
use crate::call_graph::traversal::{bfs_forward, enumerate_reverse_paths, PathOrigin, ReversePath, TraversalLimits};
use crate::call_graph::types::{ArgumentBinding, CallEdge, CallGraph, GraphNode};
use crate::columns::types::{ColumnRef, ColumnRole, ResolutionStatus, ResolvedQuery};
use crate::parsers::types::QueryType;
use crate::scanner::hasher::stable_id;

/// Walks every sensitive query of a built graph.
#[derive(Debug, Clone, Copy)]
pub struct FlowAnalyzer {
    limits: TraversalLimits,
    max_escalation: usize,
}

/// Decision for one reverse path, before grouping.
#[derive(Debug, Clone)]
struct PathOutcome {
    source: SourceKind,
    sink: SinkKind,
    action: CryptoAction,
    status: FlowStatus,
    columns: Vec<TargetColumn>,
    placements: Vec<Placement>,
    flags: Vec<FlowFlag>,
}

struct FlowGroup {
    outcome: PathOutcome,
    path: Vec<String>,
    count: usize,
}

impl FlowAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            limits: TraversalLimits::from_config(config),
            max_escalation: config.effective_max_escalation(),
        }
    }

    pub fn with_limits(limits: TraversalLimits, max_escalation: usize) -> Self {
        Self { limits, max_escalation }
    }

    /// Flow records for every query in the graph, ordered by query then path.
    ///
    /// Queries are analyzed in parallel; the graph is only read.
    pub fn analyze(&self, graph: &CallGraph) -> Vec<FlowRecord> {
        let queries: Vec<NodeIndex> = graph.queries().map(|(idx, _)| idx).collect();
        let mut flows: Vec<FlowRecord> = queries
            .par_iter()
            .flat_map_iter(|&idx| self.analyze_node(graph, idx))
            .collect();
        sort_flows(&mut flows);

        let unreachable = flows.iter().filter(|f| f.status == FlowStatus::Unreachable).count();
        let failed = flows
            .iter()
            .filter(|f| matches!(f.status, FlowStatus::ResolutionFailed { .. }))
            .count();
        info!(
            queries = queries.len(),
            flows = flows.len(),
            unreachable,
            resolution_failed = failed,
            "flow analysis complete"
        );
        flows
    }

    /// Flow records for a single query.
    pub fn analyze_query(&self, graph: &CallGraph, query_id: &str) -> Result<Vec<FlowRecord>, CallGraphError> {
        let (idx, _) = graph.query(query_id)?;
        let mut flows = self.analyze_node(graph, idx);
        sort_flows(&mut flows);
        Ok(flows)
    }

    fn analyze_node(&self, graph: &CallGraph, idx: NodeIndex) -> Vec<FlowRecord> {
        let Some(query) = graph.node(idx).and_then(GraphNode::as_query).map(|q| &q.query) else {
            return Vec::new();
        };
        if let ResolutionStatus::Failed { reason } = &query.status {
            return vec![failed_record(query, reason)];
        }
        if !query.has_sensitive_columns() {
            return Vec::new();
        }

        let found = enumerate_reverse_paths(graph, idx, self.limits);
        let truncated = found.truncated
            || found.fan_out_capped
            || found.paths.iter().any(|p| p.origin == PathOrigin::DepthLimit);

        let mut groups: Vec<FlowGroup> = Vec::new();
        let mut by_key: FxHashMap<String, usize> = FxHashMap::default();
        for path in found.paths.iter().filter(|p| p.origin.is_rooted()) {
            let mut outcome = self.evaluate_path(graph, query, path);
            if truncated {
                outcome.flags.push(FlowFlag::TruncatedTraversal);
            }
            let key = format!(
                "{:?}|{:?}|{:?}|{:?}|{:?}",
                outcome.source, outcome.sink, outcome.action, outcome.status, outcome.placements
            );
            let ids = path.ids(graph);
            match by_key.get(&key) {
                Some(&i) => {
                    let group = &mut groups[i];
                    group.count += 1;
                    group.outcome.flags.extend(outcome.flags);
                    if ids < group.path {
                        group.path = ids;
                    }
                }
                None => {
                    by_key.insert(key, groups.len());
                    groups.push(FlowGroup {
                        outcome,
                        path: ids,
                        count: 1,
                    });
                }
            }
        }

        if groups.is_empty() {
            debug!(query = query.id(), paths = found.paths.len(), "no rooted path");
            return vec![unreachable_record(query, truncated)];
        }

        groups.into_iter().map(|g| into_record(query, g)).collect()
    }

    fn evaluate_path(&self, graph: &CallGraph, query: &ResolvedQuery, path: &ReversePath) -> PathOutcome {
        let source = self.source_of(graph, query, path);
        let (encrypt_columns, decrypt_columns) = crypto_columns(query);
        let sink = if query.query_type == QueryType::Select {
            self.sink_of(graph, path)
        } else {
            SinkKind::Db
        };

        let mut columns: Vec<TargetColumn> = encrypt_columns.iter().chain(&decrypt_columns).cloned().collect();
        columns.sort();
        columns.dedup();

        let legs = self.decide_legs(source, sink, !encrypt_columns.is_empty(), !decrypt_columns.is_empty());
        let (encrypt, decrypt) = match legs {
            Ok(legs) => legs,
            Err(failure) => {
                debug!(query = query.id(), %failure, "no listed policy");
                return PathOutcome {
                    source,
                    sink,
                    action: CryptoAction::None,
                    status: FlowStatus::ResolutionFailed {
                        reason: failure.to_string(),
                    },
                    columns,
                    placements: Vec::new(),
                    flags: Vec::new(),
                };
            }
        };

        let mut flags = Vec::new();
        if path
            .edges
            .iter()
            .filter_map(|&e| graph.edge(e))
            .any(|e| e.ambiguous)
        {
            flags.push(FlowFlag::AmbiguousResolution);
        }

        let mut placements = Vec::new();
        if let Some(point) = select_insertion_point(graph, path, self.max_escalation) {
            if encrypt {
                if let Some(p) = placement(graph, point, CryptoAction::Encrypt, encrypt_columns) {
                    if graph.edge(point.call).is_some_and(|e| e.binding == ArgumentBinding::Unresolved) {
                        flags.push(FlowFlag::UnresolvedBinding);
                    }
                    placements.push(p);
                }
            }
            if decrypt {
                placements.extend(placement(graph, point, CryptoAction::Decrypt, decrypt_columns));
            }
        }

        PathOutcome {
            source,
            sink,
            action: combine(encrypt, decrypt),
            status: FlowStatus::Ok,
            columns,
            placements,
            flags,
        }
    }

    /// Whether the before-call and after-call legs act.
    ///
    /// The after-call leg of a session-sourced path is always evaluated as
    /// session to response, so it never decrypts.
    fn decide_legs(
        &self,
        source: SourceKind,
        sink: SinkKind,
        has_input: bool,
        has_output: bool,
    ) -> Result<(bool, bool), ResolutionFailure> {
        let encrypt = has_input && decide(source, SinkKind::Db)? == CryptoAction::Encrypt;
        let decrypt = if !has_output {
            false
        } else if source == SourceKind::Session {
            decide(SourceKind::Session, SinkKind::HttpResponse)?.decrypts()
        } else {
            decide(SourceKind::Db, sink)?.decrypts()
        };
        Ok((encrypt, decrypt))
    }

    fn source_of(&self, graph: &CallGraph, query: &ResolvedQuery, path: &ReversePath) -> SourceKind {
        let origin = match &path.origin {
            PathOrigin::SessionRead { .. } => return SourceKind::Session,
            PathOrigin::OutboundClient { .. } => SourceKind::ExternalApi,
            _ if scheduled_root(graph, path) => SourceKind::Db,
            _ => SourceKind::HttpRequest,
        };
        if query.query_type.is_write() && self.fed_by_select(graph, path) {
            return SourceKind::Db;
        }
        origin
    }

    /// A write whose arguments hold the result of a read on the same path,
    /// either through a variable assigned earlier or as a nested call.
    fn fed_by_select(&self, graph: &CallGraph, path: &ReversePath) -> bool {
        path.edges.iter().zip(&path.nodes).any(|(&edge, &method)| {
            let Some(toward) = graph.edge(edge) else {
                return false;
            };
            let at = (toward.line, toward.column);
            let roots: Vec<&str> = toward.arguments.iter().filter_map(|a| root_identifier(a)).collect();
            graph.callees(method).into_iter().any(|a| {
                let feeds = a.call.argument_of == Some(at)
                    || ((a.call.line, a.call.column) < at
                        && a.call.assigned_to.as_deref().is_some_and(|v| roots.contains(&v)));
                feeds && self.reads_database(graph, a.node)
            })
        })
    }

    fn reads_database(&self, graph: &CallGraph, node: NodeIndex) -> bool {
        let is_select = |n: NodeIndex| {
            graph
                .node(n)
                .and_then(GraphNode::as_query)
                .is_some_and(|q| q.query.query_type == QueryType::Select)
        };
        is_select(node)
            || bfs_forward(graph, node, Some(self.limits.max_depth))
                .into_iter()
                .any(is_select)
    }

    /// Where a SELECT's result goes, following the result from the executing
    /// method up the path while it is returned.
    fn sink_of(&self, graph: &CallGraph, path: &ReversePath) -> SinkKind {
        for i in (0..path.edges.len()).rev() {
            let Some(edge) = graph.edge(path.edges[i]) else {
                break;
            };
            if let Some(var) = &edge.assigned_to {
                if let Some(sink) = self.consumer_sink(graph, path.nodes[i], edge, var) {
                    return sink;
                }
            }
            if let Some(at) = edge.argument_of {
                let outer = graph
                    .callees(path.nodes[i])
                    .into_iter()
                    .find(|a| (a.call.line, a.call.column) == at);
                if let Some(sink) = outer.and_then(|a| self.sink_at(graph, a.node)) {
                    return sink;
                }
            }
            if !edge.is_returned {
                break;
            }
        }
        if scheduled_root(graph, path) {
            SinkKind::Db
        } else {
            SinkKind::HttpResponse
        }
    }

    /// Sink of the first later call in `method` that takes `var` as an argument.
    fn consumer_sink(&self, graph: &CallGraph, method: NodeIndex, edge: &CallEdge, var: &str) -> Option<SinkKind> {
        let position = (edge.line, edge.column);
        graph
            .callees(method)
            .into_iter()
            .filter(|a| (a.call.line, a.call.column) > position)
            .filter(|a| a.call.arguments.iter().any(|arg| mentions_identifier(arg, var)))
            .find_map(|a| self.sink_at(graph, a.node))
    }

    /// Sink of a call target that receives a query result.
    fn sink_at(&self, graph: &CallGraph, node: NodeIndex) -> Option<SinkKind> {
        match graph.node(node)? {
            GraphNode::External(ext) => match ext.boundary? {
                BoundaryKind::SessionWrite => Some(SinkKind::Session),
                BoundaryKind::OutboundClient => Some(SinkKind::ExternalApi),
                BoundaryKind::SessionRead => None,
            },
            GraphNode::Query(q) => q.query.query_type.is_write().then_some(SinkKind::Db),
            GraphNode::Method(_) => self.forward_sink(graph, node),
        }
    }

    /// Strongest sink reachable below a method that receives the result.
    fn forward_sink(&self, graph: &CallGraph, start: NodeIndex) -> Option<SinkKind> {
        let mut found: Vec<SinkKind> = bfs_forward(graph, start, Some(self.limits.max_depth))
            .into_iter()
            .filter_map(|n| match graph.node(n)? {
                GraphNode::External(ext) => match ext.boundary? {
                    BoundaryKind::SessionWrite => Some(SinkKind::Session),
                    BoundaryKind::OutboundClient => Some(SinkKind::ExternalApi),
                    BoundaryKind::SessionRead => None,
                },
                GraphNode::Query(q) => q.query.query_type.is_write().then_some(SinkKind::Db),
                GraphNode::Method(_) => None,
            })
            .collect();
        found.sort_by_key(|s| match s {
            SinkKind::Session => 0,
            SinkKind::ExternalApi => 1,
            SinkKind::Db => 2,
            SinkKind::HttpResponse => 3,
        });
        found.first().copied()
    }
}

fn scheduled_root(graph: &CallGraph, path: &ReversePath) -> bool {
    path.origin == PathOrigin::EntryPoint
        && graph
            .method(path.root())
            .and_then(|m| m.entry_point.as_ref())
            .is_some_and(|t| !t.is_http())
}

/// Sensitive columns for the before-call leg and the after-call leg.
///
/// `INSERT ... SELECT` copies stored values: only its lookup values and
/// bound written values are encrypted.
fn crypto_columns(query: &ResolvedQuery) -> (Vec<TargetColumn>, Vec<TargetColumn>) {
    let copies_rows = query.query_type == QueryType::Insert
        && query.columns.iter().any(|c| c.role == ColumnRole::Projected);
    let of = |roles: &[ColumnRole]| -> Vec<TargetColumn> {
        let mut out: Vec<TargetColumn> = query
            .columns
            .iter()
            .filter(|c| roles.contains(&c.role))
            .filter(|c| !(copies_rows && c.role == ColumnRole::Written && c.bound_parameter.is_none()))
            .filter_map(|c| target_column(query, c))
            .collect();
        out.sort();
        out.dedup();
        out
    };
    match query.query_type {
        QueryType::Insert => (of(&[ColumnRole::Written, ColumnRole::Filtered]), Vec::new()),
        QueryType::Update => (of(&[ColumnRole::Written, ColumnRole::Filtered]), Vec::new()),
        QueryType::Delete => (of(&[ColumnRole::Filtered]), Vec::new()),
        QueryType::Select => (of(&[ColumnRole::Filtered]), of(&[ColumnRole::Projected])),
    }
}

fn target_column(query: &ResolvedQuery, column: &ColumnRef) -> Option<TargetColumn> {
    Some(TargetColumn {
        table: column
            .table
            .clone()
            .or_else(|| query.primary_table().map(str::to_string)),
        column: column.name.clone(),
        kind: column.sensitivity?,
        role: column.role,
        bound_parameter: column.bound_parameter.clone(),
    })
}

fn placement(
    graph: &CallGraph,
    point: InsertionPoint,
    action: CryptoAction,
    columns: Vec<TargetColumn>,
) -> Option<Placement> {
    let method = graph.method(point.method)?;
    let call = graph.edge(point.call)?;
    let (position, description, target_variable) = if action == CryptoAction::Encrypt {
        (
            InsertionPosition::BeforeCall,
            format!("immediately before call to {} at line {}", call.call_text, call.line),
            input_variable(call, &columns),
        )
    } else if call.is_returned && call.assigned_to.is_none() {
        (
            InsertionPosition::AfterCall,
            format!("immediately after return from {}, before return statement", call.call_text),
            Some("return".to_string()),
        )
    } else {
        (
            InsertionPosition::AfterCall,
            format!("immediately after return from {} at line {}", call.call_text, call.line),
            call.assigned_to.clone(),
        )
    };
    Some(Placement {
        action,
        file: method.file.clone(),
        class: method.class.clone(),
        method: method.id.clone(),
        position,
        call_target: call.call_text.clone(),
        call_line: call.line,
        description,
        target_variable,
        columns,
    })
}

/// Caller expression carrying the values to encrypt.
fn input_variable(call: &CallEdge, columns: &[TargetColumn]) -> Option<String> {
    if let ArgumentBinding::Resolved { arguments } = &call.binding {
        for column in columns {
            let Some(root) = column.bound_parameter.as_deref().and_then(root_identifier) else {
                continue;
            };
            if let Some(arg) = arguments.iter().find(|a| a.parameter == root) {
                return Some(arg.expression.clone());
            }
        }
    }
    match call.arguments.as_slice() {
        [only] => Some(only.clone()),
        _ => None,
    }
}

/// Leading identifier of an expression: `vo` for `vo.getEmpNm()`.
fn root_identifier(expr: &str) -> Option<&str> {
    let expr = expr.trim().trim_start_matches('(');
    let expr = expr.strip_prefix("this.").unwrap_or(expr);
    let end = expr
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .unwrap_or(expr.len());
    let ident = &expr[..end];
    (!ident.is_empty() && !ident.starts_with(|c: char| c.is_ascii_digit())).then_some(ident)
}

/// `var` appears in `expr` as a whole identifier.
fn mentions_identifier(expr: &str, var: &str) -> bool {
    let is_ident = |c: char| c.is_alphanumeric() || c == '_' || c == '$';
    expr.match_indices(var).any(|(start, _)| {
        let before = expr[..start].chars().next_back();
        let after = expr[start + var.len()..].chars().next();
        !before.is_some_and(|c| is_ident(c) || c == '.') && !after.is_some_and(is_ident)
    })
}

fn into_record(query: &ResolvedQuery, group: FlowGroup) -> FlowRecord {
    let FlowGroup { outcome, path, count } = group;
    let mut flags = outcome.flags;
    flags.sort();
    flags.dedup();
    let id = flow_id(
        [
            query.id(),
            outcome.source.name(),
            outcome.sink.name(),
            outcome.action.name(),
        ]
        .into_iter()
        .chain(path.iter().map(String::as_str)),
    );
    FlowRecord {
        id,
        query_id: query.id().to_string(),
        query_type: query.query_type,
        tables: query.tables.clone(),
        status: outcome.status,
        source: Some(outcome.source),
        sink: Some(outcome.sink),
        action: outcome.action,
        path,
        path_count: count,
        columns: outcome.columns,
        placements: outcome.placements,
        flags,
    }
}

fn failed_record(query: &ResolvedQuery, reason: &str) -> FlowRecord {
    FlowRecord {
        id: flow_id([query.id(), "resolution_failed"]),
        query_id: query.id().to_string(),
        query_type: query.query_type,
        tables: query.tables.clone(),
        status: FlowStatus::ResolutionFailed {
            reason: reason.to_string(),
        },
        source: None,
        sink: None,
        action: CryptoAction::None,
        path: Vec::new(),
        path_count: 0,
        columns: Vec::new(),
        placements: Vec::new(),
        flags: Vec::new(),
    }
}

fn unreachable_record(query: &ResolvedQuery, truncated: bool) -> FlowRecord {
    let mut columns: Vec<TargetColumn> = query
        .sensitive_columns()
        .filter_map(|c| target_column(query, c))
        .collect();
    columns.sort();
    columns.dedup();
    FlowRecord {
        id: flow_id([query.id(), "unreachable"]),
        query_id: query.id().to_string(),
        query_type: query.query_type,
        tables: query.tables.clone(),
        status: FlowStatus::Unreachable,
        source: None,
        sink: None,
        action: CryptoAction::None,
        path: Vec::new(),
        path_count: 0,
        columns,
        placements: Vec::new(),
        flags: if truncated { vec![FlowFlag::TruncatedTraversal] } else { Vec::new() },
    }
}

fn flow_id<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    format!("flow-{}", stable_id(parts))
}

fn sort_flows(flows: &mut [FlowRecord]) {
    flows.sort_by(|a, b| (&a.query_id, &a.path, &a.id).cmp(&(&b.query_id, &b.path, &b.id)));
}
