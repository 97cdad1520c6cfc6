//! CallGraphBuilder: merges method declarations, resolved queries and call
//! sites into one graph.
//!
//! Node extraction runs in parallel per file; every mutation of the graph
//! happens on one thread after that barrier.

use std::time::Instant;

use applycrypto_core::types::collections::FxHashMap;
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::columns::strategies::jdbc::{executed_sql, jdbc_query_id};
use crate::columns::types::{DeclarationOrigin, ResolvedQuery};
use crate::entry_points::{EntryPoint, Trigger};
use crate::parsers::types::{CallSite, ParseResult};

use super::boundary::BoundaryMatcher;
use super::layers::classify_layer;
use super::namespace::{statement_candidates, NamespaceIndex};
use super::resolution::{CallContext, CallResolution, TypeIndex};
use super::types::{
    method_id, ArgumentBinding, BoundArgument, CallEdge, CallGraph, CallGraphStats, EdgeKind, ExternalNode,
    GraphNode, MethodNode, QueryNode, Resolution,
};

/// Builder for the merged call graph.
pub struct CallGraphBuilder {
    boundaries: BoundaryMatcher,
}

impl CallGraphBuilder {
    pub fn new(boundaries: BoundaryMatcher) -> Self {
        Self { boundaries }
    }

    /// Build the graph.
    ///
    /// Phase 1 adds method and query nodes. Phase 2 links declarations to
    /// their queries. Phase 3 resolves every call site into an edge; a call
    /// that binds to nothing in the sources gets an edge to an external node.
    pub fn build(
        &self,
        results: &[ParseResult],
        queries: &[ResolvedQuery],
        entry_points: &[EntryPoint],
    ) -> (CallGraph, CallGraphStats) {
        let start = Instant::now();
        let mut graph = CallGraph::new();
        let mut stats = CallGraphStats::default();

        let triggers: FxHashMap<&str, &Trigger> = entry_points
            .iter()
            .map(|e| (e.method_id.as_str(), &e.trigger))
            .collect();

        // Phase 1: nodes.
        let method_nodes: Vec<MethodNode> = results
            .par_iter()
            .flat_map_iter(|result| {
                result.classes.iter().flat_map(move |class| {
                    let layer = classify_layer(class);
                    class.methods.iter().map(move |m| MethodNode {
                        id: method_id(&class.qualified_name, m),
                        class: class.qualified_name.clone(),
                        name: m.name.clone(),
                        signature: m.signature(),
                        file: result.file.clone(),
                        range: m.range,
                        annotations: m.annotations.iter().map(|a| a.name.clone()).collect(),
                        parameters: m.parameters.clone(),
                        return_type: m.return_type.clone(),
                        layer,
                        entry_point: None,
                        is_abstract: !m.has_body,
                    })
                })
            })
            .collect();
        for mut node in method_nodes {
            node.entry_point = triggers.get(node.id.as_str()).map(|t| (*t).clone());
            graph.add_node(GraphNode::Method(node));
        }

        let mut inherited_ops: FxHashMap<(String, String), NodeIndex> = FxHashMap::default();
        for query in queries {
            let idx = graph.add_node(GraphNode::Query(QueryNode { query: query.clone() }));
            if let DeclarationOrigin::DerivedQuery {
                repository,
                method,
                signature,
                ..
            } = &query.declaration.origin
            {
                if signature.is_empty() {
                    inherited_ops.insert((repository.clone(), method.clone()), idx);
                }
            }
        }

        // Phase 2: declaration → query links.
        let mut mapper_methods: FxHashMap<(&str, &str), Vec<NodeIndex>> = FxHashMap::default();
        for idx in graph.graph.node_indices() {
            if let Some(m) = graph.graph[idx].as_method() {
                mapper_methods.entry((m.class.as_str(), m.name.as_str())).or_default().push(idx);
            }
        }
        let mut declaration_links: Vec<(NodeIndex, NodeIndex, Resolution)> = Vec::new();
        for (query_idx, node) in graph.queries() {
            match &node.query.declaration.origin {
                DeclarationOrigin::MapperStatement { namespace, statement_id } => {
                    for &m in mapper_methods.get(&(namespace.as_str(), statement_id.as_str())).into_iter().flatten() {
                        declaration_links.push((m, query_idx, Resolution::MapperMethod));
                    }
                }
                DeclarationOrigin::AnnotatedQuery {
                    repository,
                    method,
                    signature,
                }
                | DeclarationOrigin::DerivedQuery {
                    repository,
                    method,
                    signature,
                    ..
                } if !signature.is_empty() => {
                    if let Some(m) = graph.node_index(&format!("{repository}.{method}{signature}")) {
                        declaration_links.push((m, query_idx, Resolution::RepositoryMethod));
                    }
                }
                _ => {}
            }
        }
        for (method_idx, query_idx, resolution) in declaration_links {
            let Some(method) = graph.method(method_idx) else {
                continue;
            };
            let parameters: Vec<String> = method
                .parameters
                .iter()
                .map(|p| param_name(&p.annotations, &p.name))
                .collect();
            let edge = CallEdge {
                kind: EdgeKind::Executes,
                call_text: method.short_name(),
                line: method.range.start_line,
                column: 0,
                binding: ArgumentBinding::positional(&parameters, &parameters),
                resolution: Some(resolution),
                ambiguous: false,
                assigned_to: None,
                is_returned: true,
                argument_of: None,
                arguments: SmallVec::new(),
            };
            graph.add_edge(method_idx, query_idx, edge);
            *stats.resolution_counts.entry(resolution.name().to_string()).or_default() += 1;
        }

        // Phase 3: call sites.
        let types = TypeIndex::build(results);
        let namespaces = NamespaceIndex::build(results);
        tracing::debug!(classes = types.class_count(), namespaces = namespaces.len(), "resolution indices built");

        for result in results {
            for (class, method) in result.methods() {
                let Some(caller) = graph.node_index(&method_id(&class.qualified_name, method)) else {
                    continue;
                };
                let ctx = CallContext { result, class, method };
                for call in &method.call_sites {
                    stats.call_sites += 1;
                    let (target, kind, resolution, ambiguous, binding) =
                        match self.resolve_site(&graph, &types, &namespaces, &inherited_ops, ctx, call) {
                            Some(resolved) => resolved,
                            None => {
                                stats.unresolved_calls += 1;
                                let text = call.qualified_text();
                                let external = graph.add_node(GraphNode::External(ExternalNode {
                                    id: ExternalNode::external_id(&text),
                                    boundary: self.boundaries.classify(&text),
                                    text,
                                }));
                                (external, EdgeKind::External, None, false, ArgumentBinding::Unresolved)
                            }
                        };
                    if let Some(resolution) = resolution {
                        stats.resolved_calls += 1;
                        *stats.resolution_counts.entry(resolution.name().to_string()).or_default() += 1;
                    }
                    if ambiguous {
                        stats.ambiguous_calls += 1;
                    }
                    graph.add_edge(caller, target, call_edge(call, kind, resolution, ambiguous, binding));
                }
            }
        }

        for (idx, node) in graph.queries() {
            if graph.graph.neighbors_directed(idx, Direction::Incoming).next().is_none() {
                stats.dead_queries += 1;
                tracing::debug!(query = %node.query.id(), "query has no caller");
            }
        }

        for idx in graph.graph.node_indices() {
            match &graph.graph[idx] {
                GraphNode::Method(m) => {
                    stats.methods += 1;
                    if m.entry_point.is_some() {
                        stats.entry_points += 1;
                    }
                }
                GraphNode::Query(_) => stats.queries += 1,
                GraphNode::External(_) => stats.externals += 1,
            }
        }
        stats.edges = graph.edge_count();
        stats.resolution_rate = if stats.call_sites > 0 {
            stats.resolved_calls as f64 / stats.call_sites as f64
        } else {
            0.0
        };
        stats.build_ms = start.elapsed().as_millis() as u64;

        if stats.ambiguous_calls > 0 {
            tracing::warn!(count = stats.ambiguous_calls, "call sites resolved to a guessed overload");
        }
        tracing::info!(
            methods = stats.methods,
            queries = stats.queries,
            externals = stats.externals,
            edges = stats.edges,
            resolved = stats.resolved_calls,
            unresolved = stats.unresolved_calls,
            dead_queries = stats.dead_queries,
            build_ms = stats.build_ms,
            "call graph built"
        );
        (graph, stats)
    }

    /// Statement ids, embedded SQL, project methods, then inherited repository operations.
    fn resolve_site(
        &self,
        graph: &CallGraph,
        types: &TypeIndex,
        namespaces: &NamespaceIndex,
        inherited_ops: &FxHashMap<(String, String), NodeIndex>,
        ctx: CallContext<'_>,
        call: &CallSite,
    ) -> Option<(NodeIndex, EdgeKind, Option<Resolution>, bool, ArgumentBinding)> {
        for candidate in statement_candidates(call, &ctx.class.qualified_name, namespaces) {
            if let Ok((idx, _)) = graph.query(&candidate) {
                let binding = ArgumentBinding::Resolved {
                    arguments: call
                        .arguments
                        .iter()
                        .skip(1)
                        .map(|a| BoundArgument {
                            expression: a.clone(),
                            parameter: "parameter".to_string(),
                        })
                        .collect(),
                };
                return Some((idx, EdgeKind::Executes, Some(Resolution::StatementId), false, binding));
            }
        }

        if executed_sql(call).is_some() {
            let id = jdbc_query_id(&ctx.class.qualified_name, ctx.method, call.line);
            if let Ok((idx, query)) = graph.query(&id) {
                let binding = ArgumentBinding::Resolved {
                    arguments: query
                        .query
                        .declaration
                        .placeholders
                        .iter()
                        .enumerate()
                        .map(|(i, p)| BoundArgument {
                            expression: p.clone(),
                            parameter: format!("?{}", i + 1),
                        })
                        .collect(),
                };
                return Some((idx, EdgeKind::Executes, Some(Resolution::EmbeddedSql), false, binding));
            }
        }

        match types.resolve_call(ctx, call) {
            CallResolution::Method(target) => {
                let idx = graph.node_index(&target.id)?;
                let binding = ArgumentBinding::positional(call.arguments.as_slice(), &target.parameters);
                Some((idx, EdgeKind::Invokes, Some(target.resolution), target.ambiguous, binding))
            }
            CallResolution::Undeclared { class } => {
                let idx = *inherited_ops.get(&(class, call.callee_name.clone()))?;
                let parameters: Vec<String> = (0..call.arguments.len()).map(|i| format!("arg{i}")).collect();
                let binding = ArgumentBinding::positional(call.arguments.as_slice(), &parameters);
                Some((idx, EdgeKind::Executes, Some(Resolution::InheritedOperation), false, binding))
            }
            CallResolution::Unresolved => None,
        }
    }
}

impl Default for CallGraphBuilder {
    fn default() -> Self {
        Self::new(BoundaryMatcher::default())
    }
}

fn call_edge(
    call: &CallSite,
    kind: EdgeKind,
    resolution: Option<Resolution>,
    ambiguous: bool,
    binding: ArgumentBinding,
) -> CallEdge {
    CallEdge {
        kind,
        call_text: call.qualified_text(),
        line: call.line,
        column: call.column,
        binding,
        resolution,
        ambiguous,
        assigned_to: call.assigned_to.clone(),
        is_returned: call.is_returned,
        argument_of: call.argument_of,
        arguments: call.arguments.clone(),
    }
}

/// `@Param("empNm") String name` binds as `empNm`.
fn param_name(annotations: &[crate::parsers::types::AnnotationInfo], name: &str) -> String {
    crate::parsers::types::find_annotation(annotations, "Param")
        .and_then(|a| a.primary_value())
        .unwrap_or(name)
        .to_string()
}
