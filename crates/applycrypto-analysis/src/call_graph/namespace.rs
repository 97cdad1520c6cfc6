//! Statement-id resolution for `SqlSession`-style calls.
//!
//! DAO and service classes commonly hold `String NAMESPACE = "..."` and
//! call `sqlSession.selectList(NAMESPACE + "findEmp", param)`. The
//! extractor folds the constant into the static argument; this module
//! turns that text into a query id.

use applycrypto_core::types::collections::FxHashMap;

use crate::parsers::types::{CallSite, ParseResult};

/// `SqlSession` / `SqlSessionTemplate` / CCS DAO operations taking a statement id first.
pub const STATEMENT_METHODS: &[&str] = &[
    "selectOne",
    "selectList",
    "selectMap",
    "selectCursor",
    "select",
    "insert",
    "update",
    "delete",
];

const NAMESPACE_CONSTANT: &str = "NAMESPACE";

/// Namespace constants per class, and the reverse map.
#[derive(Debug, Default)]
pub struct NamespaceIndex {
    by_class: FxHashMap<String, String>,
    by_namespace: FxHashMap<String, Vec<String>>,
}

impl NamespaceIndex {
    pub fn build(results: &[ParseResult]) -> Self {
        let mut index = Self::default();
        for result in results {
            for class in &result.classes {
                let Some(value) = class.constant(NAMESPACE_CONSTANT) else {
                    continue;
                };
                let namespace = value.trim().trim_matches('.').to_string();
                if namespace.is_empty() {
                    continue;
                }
                index
                    .by_namespace
                    .entry(namespace.clone())
                    .or_default()
                    .push(class.qualified_name.clone());
                index.by_class.insert(class.qualified_name.clone(), namespace);
            }
        }
        index
    }

    /// Namespace declared by a class.
    pub fn namespace_of(&self, class: &str) -> Option<&str> {
        self.by_class.get(class).map(String::as_str)
    }

    /// Classes declaring a namespace.
    pub fn classes_of(&self, namespace: &str) -> &[String] {
        self.by_namespace.get(namespace).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_class.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_class.is_empty()
    }
}

/// Candidate query ids for a statement-style call, most specific first.
///
/// Returns nothing when the call is not statement-style or its first
/// argument has no static value.
pub fn statement_candidates(call: &CallSite, caller_class: &str, namespaces: &NamespaceIndex) -> Vec<String> {
    if !STATEMENT_METHODS.contains(&call.callee_name.as_str()) {
        return Vec::new();
    }
    let Some(Some(raw)) = call.static_arguments.first() else {
        return Vec::new();
    };
    let statement = normalize_statement_id(raw);
    if statement.is_empty() || statement.contains(char::is_whitespace) {
        return Vec::new();
    }
    let mut candidates = vec![statement.clone()];
    if !statement.contains('.') {
        if let Some(ns) = namespaces.namespace_of(caller_class) {
            candidates.push(format!("{ns}.{statement}"));
        }
    }
    candidates
}

/// Collapse the doubled dot left by `NAMESPACE + ".id"` with a dotted constant.
pub fn normalize_statement_id(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.trim().chars() {
        if ch == '.' && out.ends_with('.') {
            continue;
        }
        out.push(ch);
    }
    out.trim_matches('.').to_string()
}
