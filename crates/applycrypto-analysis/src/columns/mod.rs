//! Column resolution: query declarations → tables and role-split columns.
//!
//! One strategy per run, chosen by `SqlWrappingType`. Resolution of
//! individual declarations is independent and runs in parallel.

pub mod sensitivity;
pub mod sql;
pub mod strategies;
pub mod types;

use std::time::Instant;

use applycrypto_core::FxHashMap;
use rayon::prelude::*;

use crate::parsers::types::ParseResult;

pub use sensitivity::SensitivityClassifier;
pub use strategies::{create_resolver, ColumnResolver};
pub use types::{
    ColumnRef, ColumnRole, DeclarationOrigin, QueryDeclaration, ResolutionStatus, ResolvedQuery,
};

/// Learn, collect declarations from accepted artifacts, and resolve them all.
///
/// Output is sorted by query id. A repeated id (two mappers sharing a
/// namespace) keeps the first declaration by file order and renames later
/// ones `id#2`, `id#3`, ...
pub fn resolve_all(resolver: &mut dyn ColumnResolver, results: &[ParseResult]) -> Vec<ResolvedQuery> {
    let start = Instant::now();
    resolver.learn(results);
    let resolver: &dyn ColumnResolver = resolver;

    let mut declarations: Vec<QueryDeclaration> = results
        .par_iter()
        .filter(|r| resolver.accepts(r))
        .flat_map_iter(|r| resolver.declarations(r))
        .collect();
    declarations.sort_by(|a, b| (&a.id, &a.file, a.line).cmp(&(&b.id, &b.file, b.line)));

    let mut seen: FxHashMap<String, usize> = FxHashMap::default();
    for decl in &mut declarations {
        let count = seen.entry(decl.id.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            tracing::warn!(query = %decl.id, file = %decl.file, "duplicate query id");
            decl.id = format!("{}#{}", decl.id, count);
        }
    }

    let mut resolved: Vec<ResolvedQuery> = declarations.par_iter().map(|d| resolver.resolve(d)).collect();
    resolved.sort_by(|a, b| a.id().cmp(b.id()));

    let failed = resolved.iter().filter(|q| !q.is_resolved()).count();
    tracing::info!(
        strategy = %resolver.wrapping_type(),
        queries = resolved.len(),
        failed,
        resolve_ms = start.elapsed().as_millis() as u64,
        "column resolution complete"
    );
    resolved
}
