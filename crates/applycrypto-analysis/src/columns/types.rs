//! Column resolution types: query declarations and resolved queries.

use applycrypto_core::errors::ResolutionFailure;
use applycrypto_core::types::sensitivity::SensitivityKind;
use serde::{Deserialize, Serialize};

use crate::parsers::types::QueryType;

/// Clause role of a column reference. Determines crypto direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// SELECT list.
    Projected,
    /// INSERT column list or UPDATE SET target.
    Written,
    /// WHERE, JOIN ON, HAVING.
    Filtered,
}

impl ColumnRole {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Projected => "projected",
            Self::Written => "written",
            Self::Filtered => "filtered",
        }
    }
}

/// A column referenced by a query, with its role and sensitivity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
    pub role: ColumnRole,
    pub sensitivity: Option<SensitivityKind>,
    /// Placeholder or property the column is bound to, when known.
    pub bound_parameter: Option<String>,
    pub alias: Option<String>,
}

impl ColumnRef {
    pub fn is_sensitive(&self) -> bool {
        self.sensitivity.is_some()
    }
}

/// Where a query declaration came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeclarationOrigin {
    /// A MyBatis mapper statement.
    MapperStatement { namespace: String, statement_id: String },
    /// SQL text built in a method body and handed to a JDBC-style API.
    BuiltString {
        class: String,
        method: String,
        signature: String,
        call_line: u32,
    },
    /// `@Query` on a repository method.
    AnnotatedQuery {
        repository: String,
        method: String,
        signature: String,
    },
    /// A derived repository method such as `findByEmpNm`.
    DerivedQuery {
        repository: String,
        method: String,
        signature: String,
        entity: String,
    },
}

/// A query as declared in source, before column resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDeclaration {
    /// Identifier scoped to the declaring artifact.
    pub id: String,
    /// Declared statement kind; the text's own keyword wins when they differ.
    pub declared_type: Option<QueryType>,
    pub text: String,
    pub placeholders: Vec<String>,
    pub file: String,
    pub line: u32,
    pub origin: DeclarationOrigin,
    /// Data-access layer label of the declaring artifact (`mapper`, `dqm`, `dao`, `repository`).
    pub layer: String,
}

/// Outcome of resolving a declaration's columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolutionStatus {
    Resolved,
    Failed { reason: String },
}

/// A query with its tables and role-split columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedQuery {
    pub declaration: QueryDeclaration,
    pub query_type: QueryType,
    pub tables: Vec<String>,
    pub columns: Vec<ColumnRef>,
    pub status: ResolutionStatus,
}

impl ResolvedQuery {
    /// A declaration whose columns could not be determined: empty column set.
    pub fn failed(declaration: QueryDeclaration, failure: &ResolutionFailure) -> Self {
        let query_type = declaration.declared_type.unwrap_or(QueryType::Select);
        Self {
            declaration,
            query_type,
            tables: Vec::new(),
            columns: Vec::new(),
            status: ResolutionStatus::Failed {
                reason: failure.to_string(),
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.declaration.id
    }

    pub fn is_resolved(&self) -> bool {
        self.status == ResolutionStatus::Resolved
    }

    pub fn columns_with_role(&self, role: ColumnRole) -> impl Iterator<Item = &ColumnRef> {
        self.columns.iter().filter(move |c| c.role == role)
    }

    pub fn sensitive_columns(&self) -> impl Iterator<Item = &ColumnRef> {
        self.columns.iter().filter(|c| c.is_sensitive())
    }

    pub fn has_sensitive_columns(&self) -> bool {
        self.columns.iter().any(ColumnRef::is_sensitive)
    }

    pub fn primary_table(&self) -> Option<&str> {
        self.tables.first().map(String::as_str)
    }
}
