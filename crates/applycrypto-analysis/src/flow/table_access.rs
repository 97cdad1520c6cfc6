//! Per-table access summary over resolved queries and the methods that
//! reach them.

use std::collections::{BTreeMap, BTreeSet};

use applycrypto_core::types::sensitivity::SensitivityKind;
use serde::{Deserialize, Serialize};

use crate::call_graph::layers::Layer;
use crate::call_graph::traversal::bfs_inverse;
use crate::call_graph::types::CallGraph;
use crate::columns::types::ColumnRole;
use crate::parsers::types::QueryType;

/// Caller levels scanned for access files and layers.
const ACCESS_DEPTH: usize = 3;

/// One column of a table as seen across all queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    pub name: String,
    pub sensitivity: Option<SensitivityKind>,
    pub roles: BTreeSet<ColumnRole>,
}

/// How one table is accessed across the code base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableAccess {
    pub table: String,
    pub query_types: BTreeSet<QueryType>,
    pub query_ids: BTreeSet<String>,
    pub columns: Vec<TableColumn>,
    /// Declaring files plus files of methods within a few calls of a query.
    pub access_files: BTreeSet<String>,
    pub layers: BTreeSet<Layer>,
}

impl TableAccess {
    pub fn sensitive_columns(&self) -> impl Iterator<Item = &TableColumn> {
        self.columns.iter().filter(|c| c.sensitivity.is_some())
    }
}

#[derive(Default)]
struct TableAccumulator {
    query_types: BTreeSet<QueryType>,
    query_ids: BTreeSet<String>,
    columns: BTreeMap<String, TableColumn>,
    access_files: BTreeSet<String>,
    layers: BTreeSet<Layer>,
}

/// Aggregate resolved queries by table, ordered by table name.
///
/// Unqualified columns of a multi-table query are attributed to its first
/// table.
pub fn summarize_table_access(graph: &CallGraph) -> Vec<TableAccess> {
    let mut tables: BTreeMap<String, TableAccumulator> = BTreeMap::new();

    for (idx, node) in graph.queries() {
        let query = &node.query;
        if !query.is_resolved() || query.tables.is_empty() {
            continue;
        }

        let mut files = BTreeSet::new();
        let mut layers = BTreeSet::new();
        files.insert(query.declaration.file.clone());
        for caller in bfs_inverse(graph, idx, Some(ACCESS_DEPTH)) {
            if let Some(method) = graph.method(caller) {
                files.insert(method.file.clone());
                layers.insert(method.layer);
            }
        }

        for table in &query.tables {
            let acc = tables.entry(table.clone()).or_default();
            acc.query_types.insert(query.query_type);
            acc.query_ids.insert(query.id().to_string());
            acc.access_files.extend(files.iter().cloned());
            acc.layers.extend(layers.iter().copied());
        }

        for column in &query.columns {
            let Some(table) = column.table.as_ref().or_else(|| query.tables.first()) else {
                continue;
            };
            let acc = tables.entry(table.clone()).or_default();
            let entry = acc.columns.entry(column.name.clone()).or_insert_with(|| TableColumn {
                name: column.name.clone(),
                sensitivity: column.sensitivity,
                roles: BTreeSet::new(),
            });
            entry.roles.insert(column.role);
            entry.sensitivity = entry.sensitivity.or(column.sensitivity);
        }
    }

    tables
        .into_iter()
        .map(|(table, acc)| TableAccess {
            table,
            query_types: acc.query_types,
            query_ids: acc.query_ids,
            columns: acc.columns.into_values().collect(),
            access_files: acc.access_files,
            layers: acc.layers,
        })
        .collect()
}
