//! Column resolver strategies, one per SQL wrapping type.

pub mod jdbc;
pub mod jpa;
pub mod mybatis;

use applycrypto_core::config::{AliasTable, SqlWrappingType};
use applycrypto_core::errors::ResolutionFailure;

use super::sensitivity::SensitivityClassifier;
use super::sql::{analyze, StructureError};
use super::types::{ColumnRef, QueryDeclaration, ResolutionStatus, ResolvedQuery};
use crate::parsers::types::ParseResult;

/// Trait every column resolution strategy implements.
///
/// A run uses exactly one strategy, selected by `create_resolver`.
pub trait ColumnResolver: Send + Sync {
    fn wrapping_type(&self) -> SqlWrappingType;

    /// Label of the layer whose artifacts declare queries.
    fn data_access_layer(&self) -> &'static str;

    /// Whether this strategy reads declarations from the artifact.
    fn accepts(&self, result: &ParseResult) -> bool;

    /// Learn project-wide metadata before any declaration is read.
    fn learn(&mut self, _results: &[ParseResult]) {}

    /// Query declarations found in one accepted artifact.
    fn declarations(&self, result: &ParseResult) -> Vec<QueryDeclaration>;

    /// Resolve tables and role-split columns. Never guesses: a shape it
    /// cannot determine comes back failed with no columns.
    fn resolve(&self, declaration: &QueryDeclaration) -> ResolvedQuery;
}

/// Build the strategy for a wrapping type with its own copy of the alias table.
pub fn create_resolver(wrapping: SqlWrappingType, aliases: &AliasTable) -> Box<dyn ColumnResolver> {
    let classifier = SensitivityClassifier::new(aliases);
    match wrapping {
        SqlWrappingType::Mybatis => Box::new(mybatis::MybatisResolver::standard(classifier)),
        SqlWrappingType::MybatisCcs => Box::new(mybatis::MybatisResolver::ccs(classifier)),
        SqlWrappingType::Jdbc => Box::new(jdbc::JdbcResolver::new(classifier)),
        SqlWrappingType::Jpa => Box::new(jpa::JpaResolver::new(classifier)),
    }
}

/// Resolve a declaration whose text is plain SQL.
///
/// Positional placeholders (`?n`) bind to the declaration's n-th
/// placeholder name when the strategy recorded one.
pub(crate) fn resolve_sql(declaration: &QueryDeclaration, classifier: &SensitivityClassifier) -> ResolvedQuery {
    let structure = match analyze(&declaration.text) {
        Ok(s) => s,
        Err(StructureError::Empty) => {
            return failed(declaration, "statement text is empty");
        }
        Err(StructureError::UnknownStatement(keyword)) => {
            let failure = ResolutionFailure::UnknownStatement {
                query_id: declaration.id.clone(),
                keyword,
            };
            return ResolvedQuery::failed(declaration.clone(), &failure);
        }
    };

    if structure.has_star {
        return failed(declaration, "projection uses *");
    }
    if structure.missing_insert_columns {
        return failed(declaration, "INSERT without a column list");
    }
    if structure.dynamic_table || structure.tables.is_empty() {
        return failed(declaration, "table could not be determined");
    }
    if let Some(declared) = declaration.declared_type {
        if declared != structure.query_type {
            tracing::debug!(
                query = %declaration.id,
                declared = %declared,
                actual = %structure.query_type,
                "statement keyword differs from declaration"
            );
        }
    }

    let mut columns: Vec<ColumnRef> = Vec::with_capacity(structure.columns.len());
    for occurrence in structure.columns {
        let bound_parameter = occurrence
            .bound_parameter
            .map(|p| bind_positional(&p, &declaration.placeholders));
        let column = ColumnRef {
            sensitivity: classifier.classify_column(&occurrence.name, occurrence.alias.as_deref()),
            table: occurrence.table,
            name: occurrence.name,
            role: occurrence.role,
            bound_parameter,
            alias: occurrence.alias,
        };
        if !columns.contains(&column) {
            columns.push(column);
        }
    }

    ResolvedQuery {
        declaration: declaration.clone(),
        query_type: structure.query_type,
        tables: structure.tables,
        columns,
        status: ResolutionStatus::Resolved,
    }
}

/// `?2` → second recorded placeholder, if the strategy recorded one.
fn bind_positional(parameter: &str, placeholders: &[String]) -> String {
    parameter
        .strip_prefix('?')
        .and_then(|n| n.parse::<usize>().ok())
        .and_then(|n| n.checked_sub(1))
        .and_then(|idx| placeholders.get(idx))
        .filter(|p| !p.starts_with('?'))
        .cloned()
        .unwrap_or_else(|| parameter.to_string())
}

pub(crate) fn failed(declaration: &QueryDeclaration, reason: &str) -> ResolvedQuery {
    let failure = ResolutionFailure::UnresolvedColumns {
        query_id: declaration.id.clone(),
        reason: reason.to_string(),
    };
    ResolvedQuery::failed(declaration.clone(), &failure)
}

/// `empNm` → `emp_nm`, `EmployeeInfo` → `employee_info`.
pub(crate) fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let chars: Vec<char> = name.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if i > 0 && (prev_lower || (next_lower && chars[i - 1].is_uppercase())) {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(*c);
        }
    }
    out
}
