//! End-to-end run: parse → resolve → classify → build → analyze.
//!
//! Phases run in order with a cancellation check between each. Within a
//! phase, per-file and per-query work is spread over rayon.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};

use applycrypto_core::config::SqlWrappingType;
use applycrypto_core::errors::error_code;
use applycrypto_core::errors::PipelineError;
use applycrypto_core::{ApplyCryptoConfig, ApplyCryptoErrorCode, Cancellable, CancellationToken};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::call_graph::{call_trees, BoundaryMatcher, CallGraph, CallGraphBuilder, CallGraphStats, CallTreeNode};
use crate::columns::{create_resolver, resolve_all, ResolvedQuery};
use crate::entry_points::{classify_all, create_classifiers, EntryPoint, EntryPointCoverage};
use crate::flow::{summarize_table_access, FlowAnalyzer, FlowFlag, FlowRecord, FlowStatus, TableAccess};
use crate::parsers::ParserManager;
use crate::scanner::{collect_artifacts, SourceArtifact};

/// One problem surfaced to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub subject: String,
    pub message: String,
}

/// Coverage counts for the reporting collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticSummary {
    pub artifacts: usize,
    pub parsed_files: usize,
    pub queries: usize,
    pub sensitive_queries: usize,
    pub resolved_queries: usize,
    pub unresolved_queries: usize,
    pub unreachable_queries: usize,
    pub flows: usize,
    pub flows_by_action: BTreeMap<String, usize>,
    pub ambiguous_flows: usize,
    pub truncated_flows: usize,
    pub unresolved_calls: usize,
    /// Occurrences per error code.
    pub codes: BTreeMap<String, usize>,
    pub details: Vec<Diagnostic>,
}

impl DiagnosticSummary {
    fn push(&mut self, code: &str, subject: impl Into<String>, message: impl Into<String>) {
        *self.codes.entry(code.to_string()).or_insert(0) += 1;
        self.details.push(Diagnostic {
            code: code.to_string(),
            subject: subject.into(),
            message: message.into(),
        });
    }
}

/// Wall time per phase in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimings {
    pub parse_ms: u64,
    pub resolve_ms: u64,
    pub classify_ms: u64,
    pub build_ms: u64,
    pub analyze_ms: u64,
}

/// Everything one run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub sql_wrapping_type: SqlWrappingType,
    pub flows: Vec<FlowRecord>,
    pub diagnostics: DiagnosticSummary,
    pub table_access: Vec<TableAccess>,
    pub entry_points: Vec<EntryPoint>,
    pub coverage: EntryPointCoverage,
    pub call_graph: CallGraphStats,
    pub call_trees: Vec<CallTreeNode>,
    /// Not serialized: reports of unchanged sources compare byte-equal.
    #[serde(skip)]
    pub timings: PhaseTimings,
}

impl AnalysisReport {
    /// Pretty JSON with stable field and element order.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Flows that ask the code generator to change something.
    pub fn actionable_flows(&self) -> impl Iterator<Item = &FlowRecord> {
        self.flows.iter().filter(|f| !f.placements.is_empty())
    }
}

/// Intermediate state kept between phases, exposed for callers that need
/// the graph itself.
pub struct AnalysisArtifacts {
    pub queries: Vec<ResolvedQuery>,
    pub entry_points: Vec<EntryPoint>,
    pub coverage: EntryPointCoverage,
    pub graph: CallGraph,
    pub stats: CallGraphStats,
}

/// Runs the engine with one configuration. Holds no per-run state, so one
/// engine can serve many runs.
pub struct AnalysisEngine {
    config: ApplyCryptoConfig,
}

impl AnalysisEngine {
    pub fn new(config: ApplyCryptoConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ApplyCryptoConfig {
        &self.config
    }

    /// Walk `root` for artifacts, then run.
    pub fn run_on_root(&self, root: &Path, cancel: &CancellationToken) -> Result<AnalysisReport, PipelineError> {
        let (artifacts, stats) = collect_artifacts(root, &self.config.scan)?;
        info!(
            root = %root.display(),
            files = stats.total_files,
            java = stats.java_sources,
            mappers = stats.mapper_files,
            "artifacts collected"
        );
        self.run(&artifacts, cancel)
    }

    /// Run every phase over `artifacts`.
    ///
    /// Only an empty or wholly non-analyzable input set and cancellation are
    /// errors. Everything else degrades into diagnostics.
    pub fn run(&self, artifacts: &[SourceArtifact], cancel: &CancellationToken) -> Result<AnalysisReport, PipelineError> {
        let deadline = self
            .config
            .analysis
            .deadline_ms
            .map(|ms| CancellationToken::with_deadline(Duration::from_millis(ms)));
        let gate = |phase: &'static str| checkpoint(cancel, deadline.as_ref(), phase);

        if artifacts.is_empty() {
            return Err(PipelineError::NoSourceArtifacts);
        }
        if !artifacts.iter().any(|a| a.kind.is_analyzable()) {
            return Err(PipelineError::NoAnalyzableArtifacts {
                provided: artifacts.len(),
            });
        }

        let wrapping = self.config.analysis.effective_sql_wrapping_type();
        let mut timings = PhaseTimings::default();
        let mut diagnostics = DiagnosticSummary {
            artifacts: artifacts.len(),
            ..Default::default()
        };

        gate("parse")?;
        let batch = ParserManager::new().parse_all(artifacts);
        timings.parse_ms = batch.parse_ms;
        diagnostics.parsed_files = batch.results.len();
        for error in &batch.errors {
            let subject = error.path().map(|p| p.to_string_lossy().replace('\\', "/")).unwrap_or_default();
            diagnostics.push(error.error_code(), subject, error.to_string());
        }

        gate("resolve")?;
        let start = Instant::now();
        let mut resolver = create_resolver(wrapping, &self.config.alias_table());
        let queries = resolve_all(resolver.as_mut(), &batch.results);
        timings.resolve_ms = start.elapsed().as_millis() as u64;

        gate("classify")?;
        let start = Instant::now();
        let classifiers = create_classifiers(wrapping);
        let (entry_points, coverage) = classify_all(&classifiers, &batch.results);
        timings.classify_ms = start.elapsed().as_millis() as u64;

        gate("build")?;
        let builder = CallGraphBuilder::new(BoundaryMatcher::new(&self.config.boundaries));
        let (graph, stats) = builder.build(&batch.results, &queries, &entry_points);
        timings.build_ms = stats.build_ms;

        gate("analyze")?;
        let start = Instant::now();
        let flows = FlowAnalyzer::new(&self.config.analysis).analyze(&graph);
        let table_access = summarize_table_access(&graph);
        let trees = call_trees(&graph, self.config.analysis.effective_call_tree_depth());
        timings.analyze_ms = start.elapsed().as_millis() as u64;

        summarize(&mut diagnostics, &queries, &flows, &stats);
        info!(
            wrapping = %wrapping,
            flows = diagnostics.flows,
            unresolved = diagnostics.unresolved_queries,
            unreachable = diagnostics.unreachable_queries,
            total_ms = timings.parse_ms + timings.resolve_ms + timings.classify_ms + timings.build_ms + timings.analyze_ms,
            "analysis run complete"
        );

        Ok(AnalysisReport {
            sql_wrapping_type: wrapping,
            flows,
            diagnostics,
            table_access,
            entry_points,
            coverage,
            call_graph: stats,
            call_trees: trees,
            timings,
        })
    }

    /// Run the phases up to the built graph, without flow analysis.
    pub fn build_graph(&self, artifacts: &[SourceArtifact]) -> AnalysisArtifacts {
        let wrapping = self.config.analysis.effective_sql_wrapping_type();
        let batch = ParserManager::new().parse_all(artifacts);
        let mut resolver = create_resolver(wrapping, &self.config.alias_table());
        let queries = resolve_all(resolver.as_mut(), &batch.results);
        let (entry_points, coverage) = classify_all(&create_classifiers(wrapping), &batch.results);
        let (graph, stats) =
            CallGraphBuilder::new(BoundaryMatcher::new(&self.config.boundaries)).build(&batch.results, &queries, &entry_points);
        AnalysisArtifacts {
            queries,
            entry_points,
            coverage,
            graph,
            stats,
        }
    }
}

fn checkpoint(
    cancel: &CancellationToken,
    deadline: Option<&CancellationToken>,
    phase: &'static str,
) -> Result<(), PipelineError> {
    if cancel.deadline_exceeded() || deadline.is_some_and(|d| d.is_cancelled()) {
        warn!(phase, "deadline exceeded");
        return Err(PipelineError::DeadlineExceeded { phase });
    }
    if cancel.is_cancelled() {
        warn!(phase, "run cancelled");
        return Err(PipelineError::Cancelled { phase });
    }
    Ok(())
}

fn summarize(diagnostics: &mut DiagnosticSummary, queries: &[ResolvedQuery], flows: &[FlowRecord], stats: &CallGraphStats) {
    diagnostics.queries = queries.len();
    diagnostics.sensitive_queries = queries.iter().filter(|q| q.has_sensitive_columns()).count();
    diagnostics.resolved_queries = queries.iter().filter(|q| q.is_resolved()).count();
    diagnostics.unresolved_calls = stats.unresolved_calls;
    if stats.unresolved_calls > 0 {
        diagnostics
            .codes
            .insert(error_code::UNRESOLVED_CALL.to_string(), stats.unresolved_calls);
    }

    for flow in flows {
        match &flow.status {
            FlowStatus::ResolutionFailed { reason } if flow.path.is_empty() => {
                diagnostics.unresolved_queries += 1;
                diagnostics.push(error_code::RESOLUTION_FAILURE, flow.query_id.clone(), reason.clone());
            }
            FlowStatus::ResolutionFailed { reason } => {
                diagnostics.push(error_code::RESOLUTION_FAILURE, flow.query_id.clone(), reason.clone());
            }
            FlowStatus::Unreachable => {
                diagnostics.unreachable_queries += 1;
                diagnostics.push(
                    error_code::UNREACHABLE,
                    flow.query_id.clone(),
                    "no path from an entry point or boundary call",
                );
            }
            FlowStatus::Ok => {
                diagnostics.flows += 1;
                *diagnostics.flows_by_action.entry(flow.action.name().to_string()).or_insert(0) += 1;
            }
        }
        if flow.flags.contains(&FlowFlag::AmbiguousResolution) {
            diagnostics.ambiguous_flows += 1;
            diagnostics.push(
                error_code::AMBIGUOUS_RESOLUTION,
                flow.id.clone(),
                "overload guessed on path; review placement",
            );
        }
        if flow.flags.contains(&FlowFlag::TruncatedTraversal) {
            diagnostics.truncated_flows += 1;
        }
    }
}
