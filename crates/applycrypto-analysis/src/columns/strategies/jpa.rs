//! JPA strategy: entities, `@Query` methods and derived repository methods.
//!
//! `learn` reads every `@Entity` class into a table/column map. Repository
//! interfaces (`extends JpaRepository<Entity, Id>` and friends) then yield
//! one declaration per `@Query` method, one per derived finder, and the
//! inherited `save`/`saveAll`/`delete*` operations.

use applycrypto_core::config::SqlWrappingType;
use applycrypto_core::types::collections::FxHashMap;

use super::{failed, resolve_sql, snake_case, ColumnResolver};
use crate::columns::sensitivity::SensitivityClassifier;
use crate::columns::types::{
    ColumnRef, ColumnRole, DeclarationOrigin, QueryDeclaration, ResolutionStatus, ResolvedQuery,
};
use crate::parsers::types::{
    find_annotation, has_annotation, simple_type_name, type_arguments, ClassInfo, ClassKind,
    MethodInfo, ParseResult, QueryType,
};

const REPOSITORY_BASES: &[&str] = &[
    "JpaRepository",
    "CrudRepository",
    "PagingAndSortingRepository",
    "ListCrudRepository",
    "Repository",
];

/// Inherited repository operations and the statement each one issues.
const INHERITED: &[(&str, QueryType)] = &[
    ("save", QueryType::Insert),
    ("saveAll", QueryType::Insert),
    ("saveAndFlush", QueryType::Insert),
    ("delete", QueryType::Delete),
    ("deleteById", QueryType::Delete),
    ("deleteAll", QueryType::Delete),
    ("findById", QueryType::Select),
    ("findAll", QueryType::Select),
];

const SELECT_PREFIXES: &[&str] = &[
    "find", "read", "get", "query", "search", "stream", "count", "exists",
];
const DELETE_PREFIXES: &[&str] = &["delete", "remove"];

/// Predicate keywords stripped from the end of a derived criterion, longest first.
const CRITERION_SUFFIXES: &[&str] = &[
    "IsNotNull", "IsNull", "NotNull", "Null", "IgnoreCase", "StartingWith", "StartsWith",
    "EndingWith", "EndsWith", "Containing", "Contains", "NotLike", "Like", "NotIn", "In",
    "Between", "LessThanEqual", "LessThan", "GreaterThanEqual", "GreaterThan", "Before", "After",
    "IsNot", "Not", "IsTrue", "True", "IsFalse", "False", "Is", "Equals",
];

/// Name, signature, bind names and line of one repository operation.
struct RepositoryMethod {
    name: String,
    signature: String,
    parameters: Vec<String>,
    line: u32,
}

impl RepositoryMethod {
    fn declared(method: &MethodInfo, parameters: Vec<String>) -> Self {
        Self {
            name: method.name.clone(),
            signature: method.signature(),
            parameters,
            line: method.range.start_line,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct EntityMeta {
    table: String,
    /// field name → column name, declaration order.
    columns: Vec<(String, String)>,
}

impl EntityMeta {
    fn column_for(&self, property: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(property))
            .map(|(_, column)| column.as_str())
    }
}

pub struct JpaResolver {
    classifier: SensitivityClassifier,
    /// Entity simple name → metadata.
    entities: FxHashMap<String, EntityMeta>,
}

impl JpaResolver {
    pub fn new(classifier: SensitivityClassifier) -> Self {
        Self {
            classifier,
            entities: FxHashMap::default(),
        }
    }

    fn entity_by_table_or_name(&self, name: &str) -> Option<&EntityMeta> {
        self.entities
            .iter()
            .find(|(entity, meta)| entity.eq_ignore_ascii_case(name) || meta.table.eq_ignore_ascii_case(name))
            .map(|(_, meta)| meta)
    }

    fn repository_entity(&self, class: &ClassInfo) -> Option<String> {
        if class.kind != ClassKind::Interface {
            return None;
        }
        class.extends.iter().find_map(|base| {
            let simple = simple_type_name(base);
            if REPOSITORY_BASES.contains(&simple.as_str()) {
                type_arguments(base).into_iter().next()
            } else {
                None
            }
        })
    }

    fn declaration(
        &self,
        result: &ParseResult,
        class: &ClassInfo,
        entity: &str,
        shape: RepositoryMethod,
        annotated: Option<(String, bool)>,
    ) -> QueryDeclaration {
        let RepositoryMethod {
            name: method,
            signature,
            parameters,
            line,
        } = shape;
        let method = method.as_str();
        let id = format!("{}.{}{}", class.qualified_name, method, signature);
        let (text, declared_type, origin) = match annotated {
            Some((text, native)) => {
                let declared = text
                    .split_whitespace()
                    .next()
                    .and_then(QueryType::from_keyword);
                let text = if native { text } else { format!("/*jpql*/ {text}") };
                (
                    text,
                    declared,
                    DeclarationOrigin::AnnotatedQuery {
                        repository: class.qualified_name.clone(),
                        method: method.to_string(),
                        signature,
                    },
                )
            }
            None => (
                String::new(),
                derived_type(method),
                DeclarationOrigin::DerivedQuery {
                    repository: class.qualified_name.clone(),
                    method: method.to_string(),
                    signature,
                    entity: entity.to_string(),
                },
            ),
        };
        QueryDeclaration {
            id,
            declared_type,
            text,
            placeholders: parameters,
            file: result.file.clone(),
            line,
            origin,
            layer: self.data_access_layer().to_string(),
        }
    }

    fn resolve_jpql(&self, declaration: &QueryDeclaration) -> ResolvedQuery {
        let mut resolved = resolve_sql(declaration, &self.classifier);
        if !resolved.is_resolved() {
            return resolved;
        }
        // Entity names → tables; property paths → columns.
        let aliases: FxHashMap<String, String> = crate::columns::sql::analyze(&declaration.text)
            .map(|s| {
                s.table_refs
                    .into_iter()
                    .filter_map(|t| t.alias.map(|a| (a.to_lowercase(), t.name)))
                    .collect()
            })
            .unwrap_or_default();

        let mut columns = Vec::new();
        for column in resolved.columns.drain(..) {
            // `SELECT e FROM Employee e` projects the whole entity.
            if column.role == ColumnRole::Projected && aliases.contains_key(&column.name) {
                let entity = aliases.get(&column.name).and_then(|t| self.entity_by_table_or_name(t));
                match entity {
                    Some(meta) => {
                        for (_, col) in &meta.columns {
                            columns.push(self.column(&meta.table, col, ColumnRole::Projected, None));
                        }
                        continue;
                    }
                    None => {
                        return failed(declaration, "entity projection of an unknown entity");
                    }
                }
            }
            let meta = column.table.as_deref().and_then(|t| self.entity_by_table_or_name(t));
            let (table, name) = match meta {
                Some(meta) => (
                    Some(meta.table.clone()),
                    meta.column_for(&column.name)
                        .map(str::to_string)
                        .unwrap_or_else(|| snake_case(&column.name)),
                ),
                None => (column.table.clone(), column.name.clone()),
            };
            columns.push(ColumnRef {
                sensitivity: self.classifier.classify_column(&name, column.alias.as_deref()),
                table,
                name,
                ..column
            });
        }
        resolved.tables = resolved
            .tables
            .iter()
            .map(|t| {
                self.entity_by_table_or_name(t)
                    .map(|m| m.table.clone())
                    .unwrap_or_else(|| t.clone())
            })
            .collect();
        resolved.columns = dedup(columns);
        resolved
    }

    fn resolve_derived(&self, declaration: &QueryDeclaration, entity: &str, method: &str) -> ResolvedQuery {
        let Some(meta) = self.entities.get(entity) else {
            return failed(declaration, "repository entity is not a known @Entity");
        };
        let query_type = declaration.declared_type.unwrap_or(QueryType::Select);
        let mut columns = Vec::new();

        if let Some((_, written_type)) = INHERITED.iter().find(|(name, _)| *name == method) {
            match written_type {
                QueryType::Insert => {
                    let arg = declaration.placeholders.first().cloned();
                    for (field, col) in &meta.columns {
                        let bound = arg.as_ref().map(|a| format!("{a}.{field}"));
                        columns.push(self.column(&meta.table, col, ColumnRole::Written, bound));
                    }
                }
                QueryType::Select => {
                    for (_, col) in &meta.columns {
                        columns.push(self.column(&meta.table, col, ColumnRole::Projected, None));
                    }
                }
                _ => {}
            }
        } else {
            let Some(criteria) = derived_criteria(method) else {
                return failed(declaration, "derived method name has no criteria");
            };
            for (idx, property) in criteria.iter().enumerate() {
                let Some(col) = meta.column_for(property) else {
                    return failed(declaration, &format!("property {property} is not mapped on {entity}"));
                };
                let bound = declaration.placeholders.get(idx).cloned();
                columns.push(self.column(&meta.table, col, ColumnRole::Filtered, bound));
            }
            let returns_entities = query_type == QueryType::Select
                && !method.starts_with("count")
                && !method.starts_with("exists");
            if returns_entities {
                for (_, col) in &meta.columns {
                    columns.push(self.column(&meta.table, col, ColumnRole::Projected, None));
                }
            }
        }

        ResolvedQuery {
            declaration: declaration.clone(),
            query_type,
            tables: vec![meta.table.clone()],
            columns: dedup(columns),
            status: ResolutionStatus::Resolved,
        }
    }

    fn column(&self, table: &str, name: &str, role: ColumnRole, bound: Option<String>) -> ColumnRef {
        ColumnRef {
            table: Some(table.to_string()),
            name: name.to_string(),
            role,
            sensitivity: self.classifier.classify(name),
            bound_parameter: bound,
            alias: None,
        }
    }
}

impl ColumnResolver for JpaResolver {
    fn wrapping_type(&self) -> SqlWrappingType {
        SqlWrappingType::Jpa
    }

    fn data_access_layer(&self) -> &'static str {
        "repository"
    }

    fn accepts(&self, result: &ParseResult) -> bool {
        result.classes.iter().any(|c| self.repository_entity(c).is_some())
    }

    fn learn(&mut self, results: &[ParseResult]) {
        for class in results.iter().flat_map(|r| r.classes.iter()) {
            if !has_annotation(&class.annotations, "Entity") {
                continue;
            }
            let table = find_annotation(&class.annotations, "Table")
                .and_then(|t| t.argument("name"))
                .and_then(|v| v.first())
                .map(|s| s.to_lowercase())
                .unwrap_or_else(|| snake_case(&class.name));
            let columns = class
                .fields
                .iter()
                .filter(|f| !has_annotation(&f.annotations, "Transient"))
                .filter(|f| !has_annotation(&f.annotations, "OneToMany") && !has_annotation(&f.annotations, "ManyToMany"))
                .map(|f| {
                    let column = find_annotation(&f.annotations, "Column")
                        .or_else(|| find_annotation(&f.annotations, "JoinColumn"))
                        .and_then(|c| c.argument("name"))
                        .and_then(|v| v.first())
                        .map(|s| s.to_lowercase())
                        .unwrap_or_else(|| snake_case(&f.name));
                    (f.name.clone(), column)
                })
                .collect();
            tracing::debug!(entity = %class.name, table = %table, "learned entity");
            self.entities.insert(class.name.clone(), EntityMeta { table, columns });
        }
    }

    fn declarations(&self, result: &ParseResult) -> Vec<QueryDeclaration> {
        let mut out = Vec::new();
        for class in &result.classes {
            let Some(entity) = self.repository_entity(class) else {
                continue;
            };
            let mut declared: Vec<&str> = Vec::new();
            for method in &class.methods {
                declared.push(&method.name);
                let parameters = parameter_names(method);
                if let Some(query) = find_annotation(&method.annotations, "Query") {
                    let Some(text) = query.primary_value() else {
                        continue;
                    };
                    let native = query
                        .argument("nativeQuery")
                        .and_then(|v| v.first())
                        .is_some_and(|v| v == "true");
                    out.push(self.declaration(
                        result,
                        class,
                        &entity,
                        RepositoryMethod::declared(method, parameters),
                        Some((text.to_string(), native)),
                    ));
                } else if derived_type(&method.name).is_some() {
                    out.push(self.declaration(
                        result,
                        class,
                        &entity,
                        RepositoryMethod::declared(method, parameters),
                        None,
                    ));
                }
            }
            // Inherited operations the interface does not redeclare.
            for (name, _) in INHERITED {
                if declared.contains(name) {
                    continue;
                }
                let parameter = match *name {
                    "save" | "saveAndFlush" | "delete" => vec!["entity".to_string()],
                    "saveAll" | "deleteAll" => vec!["entities".to_string()],
                    "deleteById" | "findById" => vec!["id".to_string()],
                    _ => Vec::new(),
                };
                let shape = RepositoryMethod {
                    name: name.to_string(),
                    signature: String::new(),
                    parameters: parameter,
                    line: class.range.start_line,
                };
                out.push(self.declaration(result, class, &entity, shape, None));
            }
        }
        out
    }

    fn resolve(&self, declaration: &QueryDeclaration) -> ResolvedQuery {
        match &declaration.origin {
            DeclarationOrigin::DerivedQuery { entity, method, .. } => {
                self.resolve_derived(declaration, entity, method)
            }
            DeclarationOrigin::AnnotatedQuery { .. } if declaration.text.starts_with("/*jpql*/") => {
                self.resolve_jpql(declaration)
            }
            _ => resolve_sql(declaration, &self.classifier),
        }
    }
}

fn parameter_names(method: &MethodInfo) -> Vec<String> {
    method
        .parameters
        .iter()
        .map(|p| {
            // @Param("nm") overrides the Java name for :nm binding.
            p.annotations
                .iter()
                .find(|a| a.is("Param"))
                .and_then(|a| a.primary_value())
                .map(str::to_string)
                .unwrap_or_else(|| p.name.clone())
        })
        .collect()
}

/// Statement kind of a derived or inherited repository method.
fn derived_type(method: &str) -> Option<QueryType> {
    if let Some((_, t)) = INHERITED.iter().find(|(name, _)| *name == method) {
        return Some(*t);
    }
    let by = method.find("By")?;
    let prefix = &method[..by];
    if SELECT_PREFIXES.iter().any(|p| prefix.starts_with(p)) {
        Some(QueryType::Select)
    } else if DELETE_PREFIXES.iter().any(|p| prefix.starts_with(p)) {
        Some(QueryType::Delete)
    } else {
        None
    }
}

/// Property names of a derived method: `findByEmpNmAndBirthDtOrderByIdDesc`
/// → `["empNm", "birthDt"]`.
fn derived_criteria(method: &str) -> Option<Vec<String>> {
    let by = method.find("By")?;
    let mut rest = &method[by + 2..];
    if let Some(order) = rest.find("OrderBy") {
        rest = &rest[..order];
    }
    if rest.is_empty() {
        return None;
    }
    let mut properties = Vec::new();
    for part in split_camel_keyword(rest, &["And", "Or"]) {
        let mut prop = part.as_str();
        for suffix in CRITERION_SUFFIXES {
            if let Some(stripped) = prop.strip_suffix(suffix) {
                if !stripped.is_empty() {
                    prop = stripped;
                    break;
                }
            }
        }
        let mut chars = prop.chars();
        let Some(first) = chars.next() else {
            continue;
        };
        properties.push(first.to_lowercase().chain(chars).collect());
    }
    Some(properties)
}

/// Split at `And`/`Or` only where they start a new capitalized word.
fn split_camel_keyword(text: &str, keywords: &[&str]) -> Vec<String> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 1;
    while i < text.len() {
        let matched = keywords.iter().find(|k| {
            text[i..].starts_with(*k)
                && text[i + k.len()..].chars().next().is_some_and(|c| c.is_uppercase())
        });
        if let Some(k) = matched {
            parts.push(text[start..i].to_string());
            i += k.len();
            start = i;
        } else {
            i += text[i..].chars().next().map_or(1, char::len_utf8);
        }
    }
    parts.push(text[start..].to_string());
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

fn dedup(columns: Vec<ColumnRef>) -> Vec<ColumnRef> {
    let mut out: Vec<ColumnRef> = Vec::with_capacity(columns.len());
    for c in columns {
        if !out.contains(&c) {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use applycrypto_core::config::AliasTable;
    use applycrypto_core::types::sensitivity::SensitivityKind;

    use super::*;
    use crate::parsers::java::parse_java;

    const ENTITY: &[u8] = br#"
package com.acme;
@Entity
@Table(name = "EMPLOYEE")
public class Employee {
    @Id private Long id;
    @Column(name = "EMP_NM") private String empNm;
    private String birthDt;
    @Transient private String display;
}
"#;

    const REPO: &[u8] = br#"
package com.acme;
public interface EmployeeRepository extends JpaRepository<Employee, Long> {
    List<Employee> findByEmpNmAndBirthDtOrderByIdDesc(String empNm, String birthDt);
    long countByEmpNm(String empNm);
    @Query("SELECT e FROM Employee e WHERE e.empNm = :nm")
    List<Employee> search(@Param("nm") String name);
}
"#;

    fn resolver() -> (JpaResolver, ParseResult) {
        let entity = parse_java(ENTITY, Path::new("Employee.java")).unwrap();
        let repo = parse_java(REPO, Path::new("EmployeeRepository.java")).unwrap();
        let mut r = JpaResolver::new(SensitivityClassifier::new(&AliasTable::builtin()));
        r.learn(&[entity, repo.clone()]);
        (r, repo)
    }

    #[test]
    fn derived_criteria_parsing() {
        assert_eq!(
            derived_criteria("findByEmpNmAndBirthDtOrderByIdDesc").unwrap(),
            vec!["empNm", "birthDt"]
        );
        assert_eq!(derived_criteria("findByOrderNoContaining").unwrap(), vec!["orderNo"]);
        assert_eq!(derived_criteria("findAllByEmpNmIgnoreCase").unwrap(), vec!["empNm"]);
        assert_eq!(derived_type("deleteByEmpNm"), Some(QueryType::Delete));
        assert_eq!(derived_type("helper"), None);
    }

    #[test]
    fn learns_entity_and_resolves_derived_finder() {
        let (r, repo) = resolver();
        assert!(r.accepts(&repo));
        let decls = r.declarations(&repo);
        let find = decls
            .iter()
            .find(|d| d.id.starts_with("com.acme.EmployeeRepository.findByEmpNm"))
            .unwrap();
        let q = r.resolve(find);
        assert!(q.is_resolved());
        assert_eq!(q.tables, vec!["employee"]);
        let filtered: Vec<_> = q.columns_with_role(ColumnRole::Filtered).collect();
        assert_eq!(filtered[0].name, "emp_nm");
        assert_eq!(filtered[0].bound_parameter.as_deref(), Some("empNm"));
        assert_eq!(filtered[1].sensitivity, Some(SensitivityKind::DateOfBirth));
        assert!(q.columns_with_role(ColumnRole::Projected).all(|c| c.name != "display"));

        let count = decls.iter().find(|d| d.id.contains("countByEmpNm")).unwrap();
        assert_eq!(r.resolve(count).columns_with_role(ColumnRole::Projected).count(), 0);
    }

    #[test]
    fn inherited_save_writes_every_column() {
        let (r, repo) = resolver();
        let decls = r.declarations(&repo);
        let save = decls.iter().find(|d| d.id == "com.acme.EmployeeRepository.save").unwrap();
        let q = r.resolve(save);
        assert_eq!(q.query_type, QueryType::Insert);
        let written: Vec<&str> = q.columns_with_role(ColumnRole::Written).map(|c| c.name.as_str()).collect();
        assert_eq!(written, vec!["id", "emp_nm", "birth_dt"]);
    }

    #[test]
    fn jpql_query_maps_entity_names() {
        let (r, repo) = resolver();
        let decls = r.declarations(&repo);
        let search = decls.iter().find(|d| d.id.contains(".search(")).unwrap();
        let q = r.resolve(search);
        assert!(q.is_resolved(), "{:?}", q.status);
        assert_eq!(q.tables, vec!["employee"]);
        let filtered: Vec<_> = q.columns_with_role(ColumnRole::Filtered).collect();
        assert_eq!(filtered[0].name, "emp_nm");
        assert_eq!(filtered[0].bound_parameter.as_deref(), Some("nm"));
        assert_eq!(q.columns_with_role(ColumnRole::Projected).count(), 3);
    }
}
