//! JDBC strategy: SQL assembled in Java and passed to a statement API.

use applycrypto_core::config::SqlWrappingType;

use super::{resolve_sql, ColumnResolver};
use crate::columns::sensitivity::SensitivityClassifier;
use crate::columns::types::{DeclarationOrigin, QueryDeclaration, ResolvedQuery};
use crate::parsers::types::{CallSite, MethodInfo, ParseResult, QueryType};
use crate::scanner::language_detect::ArtifactKind;

/// Calls whose first argument is executable SQL.
pub const EXECUTE_METHODS: &[&str] = &[
    "prepareStatement",
    "prepareCall",
    "executeQuery",
    "executeUpdate",
    "execute",
    "query",
    "update",
    "queryForList",
    "queryForObject",
    "queryForMap",
    "batchUpdate",
];

/// `JdbcTemplate`-style calls that take bind values after the SQL.
const VARARG_BINDERS: &[&str] = &["query", "update", "queryForList", "queryForObject", "queryForMap"];

pub struct JdbcResolver {
    classifier: SensitivityClassifier,
}

impl JdbcResolver {
    pub fn new(classifier: SensitivityClassifier) -> Self {
        Self { classifier }
    }
}

impl ColumnResolver for JdbcResolver {
    fn wrapping_type(&self) -> SqlWrappingType {
        SqlWrappingType::Jdbc
    }

    fn data_access_layer(&self) -> &'static str {
        "dao"
    }

    fn accepts(&self, result: &ParseResult) -> bool {
        result.kind == ArtifactKind::JavaSource
    }

    fn declarations(&self, result: &ParseResult) -> Vec<QueryDeclaration> {
        let mut out = Vec::new();
        for (class, method) in result.methods() {
            for call in &method.call_sites {
                let Some(text) = executed_sql(call) else {
                    continue;
                };
                out.push(QueryDeclaration {
                    id: jdbc_query_id(&class.qualified_name, method, call.line),
                    declared_type: first_keyword_type(text),
                    text: text.to_string(),
                    placeholders: bind_values(method, call),
                    file: result.file.clone(),
                    line: call.line,
                    origin: DeclarationOrigin::BuiltString {
                        class: class.qualified_name.clone(),
                        method: method.name.clone(),
                        signature: method.signature(),
                        call_line: call.line,
                    },
                    layer: self.data_access_layer().to_string(),
                });
            }
        }
        out
    }

    fn resolve(&self, declaration: &QueryDeclaration) -> ResolvedQuery {
        resolve_sql(declaration, &self.classifier)
    }
}

/// `pkg.EmpDao.save(EmpVO)@42`.
pub fn jdbc_query_id(class: &str, method: &MethodInfo, line: u32) -> String {
    format!("{}.{}{}@{}", class, method.name, method.signature(), line)
}

/// Statically known SQL text handed to an execute-style call.
pub fn executed_sql(call: &CallSite) -> Option<&str> {
    if !EXECUTE_METHODS.contains(&call.callee_name.as_str()) {
        return None;
    }
    let text = call.static_arguments.first()?.as_deref()?;
    first_keyword_type(text).map(|_| text)
}

fn first_keyword_type(text: &str) -> Option<QueryType> {
    let first = text
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()?;
    if first.eq_ignore_ascii_case("with") {
        return Some(QueryType::Select);
    }
    QueryType::from_keyword(first)
}

/// Expression bound to each `?`, in order.
///
/// `PreparedStatement` setters on the variable holding the statement
/// (`ps.setString(1, vo.getEmpNm())`) win; otherwise `JdbcTemplate`
/// varargs after the SQL argument are used.
fn bind_values(method: &MethodInfo, call: &CallSite) -> Vec<String> {
    let mut by_index: Vec<(usize, String)> = Vec::new();
    if let Some(statement_var) = &call.assigned_to {
        for setter in &method.call_sites {
            if setter.line < call.line
                || setter.receiver.as_deref() != Some(statement_var.as_str())
                || !setter.callee_name.starts_with("set")
                || setter.arguments.len() != 2
            {
                continue;
            }
            if let Ok(idx) = setter.arguments[0].trim().parse::<usize>() {
                by_index.push((idx, setter.arguments[1].clone()));
            }
        }
    }
    if by_index.is_empty() && VARARG_BINDERS.contains(&call.callee_name.as_str()) {
        return call
            .arguments
            .iter()
            .skip(1)
            .filter(|a| !a.contains("RowMapper") && !a.contains("->") && !a.ends_with(".class"))
            .cloned()
            .collect();
    }
    by_index.sort_by_key(|(idx, _)| *idx);
    let mut values = Vec::new();
    for (idx, value) in by_index {
        while values.len() + 1 < idx {
            values.push(format!("?{}", values.len() + 1));
        }
        if values.len() + 1 == idx {
            values.push(value);
        }
    }
    values
}
