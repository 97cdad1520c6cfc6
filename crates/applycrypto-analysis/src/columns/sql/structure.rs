//! Structural SQL extraction.
//!
//! Finds the statement kind, the tables in scope, and every column
//! reference with the clause role it appears in. Subqueries are analyzed
//! in their own scope; everything inside a WHERE/JOIN subquery is a
//! filtered reference. No SQL is evaluated.

use applycrypto_core::types::collections::FxHashMap;

use super::tokenizer::{tokenize, Token};
use crate::columns::types::ColumnRole;
use crate::parsers::types::QueryType;

/// Words that never name a column.
const KEYWORDS: &[&str] = &[
    "ALL", "AND", "ANY", "AS", "ASC", "BETWEEN", "BY", "CASE", "CONNECT", "CROSS", "CURRENT_DATE",
    "CURRENT_TIMESTAMP", "CURRVAL", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DUAL", "DUPLICATE",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXISTS", "FALSE", "FETCH", "FIRST", "FOR", "FROM", "FULL",
    "GROUP", "HAVING", "IN", "INNER", "INSERT", "INTERSECT", "INTERVAL", "INTO", "IS", "JOIN",
    "KEY", "LEFT", "LEVEL", "LIKE", "LIMIT", "MINUS", "NATURAL", "NEXT", "NEXTVAL", "NOT", "NULL",
    "NULLS", "OFFSET", "ON", "ONLY", "OR", "ORDER", "OUTER", "OVER", "PARTITION", "PRIOR",
    "RETURNING", "RIGHT", "ROW", "ROWNUM", "ROWS", "SELECT", "SET", "SOME", "START", "SYSDATE",
    "SYSTIMESTAMP", "THEN", "TOP", "TRUE", "UNION", "UPDATE", "USING", "VALUES", "WHEN", "WHERE",
    "WITH",
];

/// Keywords that end a FROM item list.
const FROM_TERMINATORS: &[&str] = &[
    "WHERE", "GROUP", "HAVING", "ORDER", "UNION", "MINUS", "INTERSECT", "EXCEPT", "LIMIT", "OFFSET",
    "FETCH", "FOR", "CONNECT", "START", "SET", "RETURNING",
];

const JOIN_WORDS: &[&str] = &["JOIN", "INNER", "LEFT", "RIGHT", "FULL", "OUTER", "CROSS", "NATURAL"];

fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}

/// A table in some scope of the statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Lowercase table name without schema.
    pub name: String,
    pub alias: Option<String>,
}

/// One column reference found in the statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnOccurrence {
    /// Owning table, when the qualifier or a single-table scope decides it.
    pub table: Option<String>,
    /// Column name, lowercase.
    pub name: String,
    pub role: ColumnRole,
    /// Select-list alias of the item this column alone makes up.
    pub alias: Option<String>,
    /// Placeholder the column is compared against or assigned from.
    pub bound_parameter: Option<String>,
}

/// The structural shape of one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStructure {
    pub query_type: QueryType,
    /// Distinct table names in first-seen order, every scope included.
    pub tables: Vec<String>,
    pub columns: Vec<ColumnOccurrence>,
    /// A `*` or `t.*` projection was seen.
    pub has_star: bool,
    /// INSERT without an explicit column list.
    pub missing_insert_columns: bool,
    /// A table position holds a `${...}` substitution or other non-name.
    pub dynamic_table: bool,
    /// Every named table with its alias, every scope included.
    pub table_refs: Vec<TableRef>,
}

/// Why a text could not be analyzed at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    Empty,
    UnknownStatement(String),
}

/// Analyze one SQL statement.
pub fn analyze(sql: &str) -> Result<SqlStructure, StructureError> {
    let tokens = tokenize(sql);
    let tokens: Vec<Token> = tokens.into_iter().filter(|t| *t != Token::Semicolon).collect();
    let mut body: &[Token] = &tokens;

    let mut acc = Accumulator::default();
    if body.first().is_some_and(|t| t.is_word("WITH")) {
        body = skip_ctes(body, &mut acc);
    }
    let Some(first) = body.first() else {
        return Err(StructureError::Empty);
    };
    let keyword = first.ident().unwrap_or_default().to_string();
    let query_type = QueryType::from_keyword(&keyword)
        .ok_or_else(|| StructureError::UnknownStatement(keyword.clone()))?;

    match query_type {
        QueryType::Select => acc.select(body, None),
        QueryType::Insert => acc.insert(body),
        QueryType::Update => acc.update(body),
        QueryType::Delete => acc.delete(body),
    }

    Ok(SqlStructure {
        query_type,
        tables: acc.tables,
        columns: acc.columns,
        has_star: acc.has_star,
        missing_insert_columns: acc.missing_insert_columns,
        dynamic_table: acc.dynamic_table,
        table_refs: acc.table_refs,
    })
}

/// `WITH a AS (...), b AS (...) SELECT ...` → analyze each body, return the main statement.
fn skip_ctes<'t>(tokens: &'t [Token], acc: &mut Accumulator) -> &'t [Token] {
    let mut i = 1;
    while i < tokens.len() {
        // name [ (cols) ] AS ( body )
        while i < tokens.len() && tokens[i] != Token::LParen {
            i += 1;
        }
        let Some(close) = matching_paren(tokens, i) else {
            return &tokens[tokens.len()..];
        };
        // Skip an optional column list preceding AS.
        if tokens.get(close + 1).is_some_and(|t| t.is_word("AS")) {
            i = close + 2;
            continue;
        }
        let mut scope = Accumulator::default();
        scope.select(&tokens[i + 1..close], None);
        acc.absorb(scope, None);
        i = close + 1;
        if tokens.get(i) == Some(&Token::Comma) {
            i += 1;
            continue;
        }
        break;
    }
    &tokens[i.min(tokens.len())..]
}

#[derive(Default)]
struct Accumulator {
    tables: Vec<String>,
    columns: Vec<ColumnOccurrence>,
    has_star: bool,
    missing_insert_columns: bool,
    dynamic_table: bool,
    table_refs: Vec<TableRef>,
}

/// Name resolution inside one SELECT/UPDATE/DELETE scope.
#[derive(Default)]
struct Scope {
    tables: Vec<TableRef>,
    /// alias or name → table; derived tables map to their single inner table.
    by_alias: FxHashMap<String, Option<String>>,
}

impl Scope {
    fn add(&mut self, table: TableRef) {
        self.by_alias.insert(table.name.clone(), Some(table.name.clone()));
        if let Some(alias) = &table.alias {
            self.by_alias.insert(alias.to_lowercase(), Some(table.name.clone()));
        }
        self.tables.push(table);
    }

    fn add_derived(&mut self, alias: Option<String>, inner_table: Option<String>) {
        if let Some(alias) = alias {
            self.by_alias.insert(alias.to_lowercase(), inner_table);
        }
    }

    fn resolve(&self, qualifier: Option<&str>) -> Option<String> {
        match qualifier {
            Some(q) => self.by_alias.get(&q.to_lowercase()).cloned().flatten(),
            None if self.tables.len() == 1 => Some(self.tables[0].name.clone()),
            None => None,
        }
    }
}

/// A raw reference before scope resolution.
struct RawRef {
    qualifier: Option<String>,
    name: String,
}

impl Accumulator {
    fn note_table(&mut self, name: &str) {
        if !self.tables.iter().any(|t| t == name) {
            self.tables.push(name.to_string());
        }
    }

    /// Merge a nested scope; `role` forces every absorbed column's role.
    fn absorb(&mut self, other: Accumulator, role: Option<ColumnRole>) {
        for t in other.tables {
            self.note_table(&t);
        }
        for mut c in other.columns {
            if let Some(r) = role {
                c.role = r;
                c.alias = None;
            }
            self.columns.push(c);
        }
        self.has_star |= other.has_star && role.is_none();
        self.dynamic_table |= other.dynamic_table;
        self.table_refs.extend(other.table_refs);
    }

    fn push_column(&mut self, scope: &Scope, raw: RawRef, role: ColumnRole, alias: Option<String>, bound: Option<String>) {
        self.columns.push(ColumnOccurrence {
            table: scope.resolve(raw.qualifier.as_deref()),
            name: raw.name.to_lowercase(),
            role,
            alias: alias.map(|a| a.to_lowercase()),
            bound_parameter: bound,
        });
    }

    // ---- SELECT ----

    fn select(&mut self, tokens: &[Token], forced: Option<ColumnRole>) {
        for part in split_set_operations(tokens) {
            let mut scope_acc = Accumulator::default();
            scope_acc.select_single(part);
            self.absorb(scope_acc, forced);
        }
    }

    fn select_single(&mut self, tokens: &[Token]) {
        let from = find_top_level(tokens, 0, &["FROM"]);
        let list_end = from.unwrap_or(tokens.len());
        let mut scope = Scope::default();

        if let Some(from) = from {
            let end = find_top_level(tokens, from + 1, FROM_TERMINATORS).unwrap_or(tokens.len());
            self.from_items(&tokens[from + 1..end], &mut scope);
        }

        self.select_list(&tokens[1.min(list_end)..list_end], &scope);

        for (keyword, role) in [("WHERE", ColumnRole::Filtered), ("HAVING", ColumnRole::Filtered)] {
            if let Some(start) = find_top_level(tokens, 0, &[keyword]) {
                let end = find_top_level(tokens, start + 1, FROM_TERMINATORS).unwrap_or(tokens.len());
                self.predicates(&tokens[start + 1..end], &scope, role);
            }
        }
        if let Some(start) = find_top_level(tokens, 0, &["CONNECT", "START"]) {
            let end = find_top_level(tokens, start + 1, &["GROUP", "ORDER", "UNION"]).unwrap_or(tokens.len());
            self.predicates(&tokens[start + 1..end], &scope, ColumnRole::Filtered);
        }
    }

    fn select_list(&mut self, tokens: &[Token], scope: &Scope) {
        let mut start = 0;
        // DISTINCT / ALL / TOP n
        while start < tokens.len() {
            if tokens[start].is_word("DISTINCT") || tokens[start].is_word("ALL") || tokens[start].is_word("UNIQUE") {
                start += 1;
            } else if tokens[start].is_word("TOP") {
                start += 2;
            } else {
                break;
            }
        }
        for item in split_top_level(&tokens[start.min(tokens.len())..], |t| *t == Token::Comma) {
            if item.is_empty() {
                continue;
            }
            if is_star_item(item) {
                self.has_star = true;
                continue;
            }
            let (expr, alias) = split_alias(item);
            let refs = self.references(expr, scope, None);
            let alias = if refs.len() == 1 { alias } else { None };
            for raw in refs {
                self.push_column(scope, raw, ColumnRole::Projected, alias.clone(), None);
            }
        }
    }

    fn from_items(&mut self, tokens: &[Token], scope: &mut Scope) {
        let mut i = 0;
        let mut item_start = 0;
        let mut pending_on: Vec<(usize, usize)> = Vec::new();
        while i <= tokens.len() {
            let at_end = i == tokens.len();
            let boundary = at_end
                || tokens[i] == Token::Comma
                || JOIN_WORDS.iter().any(|w| tokens[i].is_word(w));
            if boundary {
                if i > item_start {
                    let item = &tokens[item_start..i];
                    let on = find_top_level(item, 0, &["ON", "USING"]);
                    let table_part = &item[..on.unwrap_or(item.len())];
                    self.table_item(table_part, scope);
                    if let Some(on) = on {
                        pending_on.push((item_start + on + 1, i));
                    }
                }
                if at_end {
                    break;
                }
                // Consume the whole join keyword run.
                i += 1;
                while i < tokens.len() && JOIN_WORDS.iter().any(|w| tokens[i].is_word(w)) {
                    i += 1;
                }
                item_start = i;
                continue;
            }
            if tokens[i] == Token::LParen {
                i = matching_paren(tokens, i).map(|c| c + 1).unwrap_or(tokens.len());
                continue;
            }
            i += 1;
        }
        // ON conditions see every table of the FROM clause.
        for (start, end) in pending_on {
            self.predicates(&tokens[start..end], scope, ColumnRole::Filtered);
        }
    }

    fn table_item(&mut self, item: &[Token], scope: &mut Scope) {
        let Some(first) = item.first() else {
            return;
        };
        if *first == Token::LParen {
            let close = matching_paren(item, 0).unwrap_or(item.len());
            let inner = &item[1..close.min(item.len())];
            let alias = alias_after(&item[(close + 1).min(item.len())..]);
            let mut nested = Accumulator::default();
            nested.select(inner, None);
            let inner_table = if nested.tables.len() == 1 {
                nested.tables.first().cloned()
            } else {
                None
            };
            self.absorb(nested, None);
            scope.add_derived(alias, inner_table);
            return;
        }
        // schema.table [AS] alias
        let mut j = 0;
        let mut name = None;
        while j < item.len() {
            match &item[j] {
                t @ (Token::Word(_) | Token::Quoted(_)) => {
                    name = t.ident().map(|s| s.to_lowercase());
                    if item.get(j + 1) == Some(&Token::Dot) {
                        j += 2;
                        continue;
                    }
                    j += 1;
                    break;
                }
                Token::Placeholder(_) => {
                    self.dynamic_table = true;
                    return;
                }
                _ => return,
            }
        }
        let Some(name) = name else {
            return;
        };
        let alias = alias_after(&item[j.min(item.len())..]);
        self.note_table(&name);
        let table = TableRef { name, alias };
        self.table_refs.push(table.clone());
        scope.add(table);
    }

    /// Collect column references in an expression. Subqueries are analyzed
    /// in their own scope; `subquery_role`, when set, overrides their roles.
    fn references(&mut self, tokens: &[Token], scope: &Scope, subquery_role: Option<ColumnRole>) -> Vec<RawRef> {
        let mut refs = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            match &tokens[i] {
                Token::LParen => {
                    let close = matching_paren(tokens, i).unwrap_or(tokens.len());
                    let inner = &tokens[i + 1..close.min(tokens.len())];
                    if inner.first().is_some_and(|t| t.is_word("SELECT") || t.is_word("WITH")) {
                        let mut nested = Accumulator::default();
                        nested.select(inner, None);
                        self.absorb(nested, subquery_role);
                    } else {
                        refs.extend(self.references(inner, scope, subquery_role));
                    }
                    i = close + 1;
                }
                t @ (Token::Word(_) | Token::Quoted(_)) => {
                    let word = t.ident().unwrap_or_default();
                    let is_quoted = matches!(t, Token::Quoted(_));
                    // function call
                    if tokens.get(i + 1) == Some(&Token::LParen) && !is_quoted {
                        i += 1;
                        continue;
                    }
                    if !is_quoted && is_keyword(word) {
                        i += 1;
                        continue;
                    }
                    // qualifier.column
                    if tokens.get(i + 1) == Some(&Token::Dot) {
                        match tokens.get(i + 2) {
                            Some(next) if next.ident().is_some() => {
                                let column = next.ident().unwrap_or_default();
                                let is_fn = tokens.get(i + 3) == Some(&Token::LParen);
                                if !is_fn && !is_keyword(column) {
                                    refs.push(RawRef {
                                        qualifier: Some(word.to_string()),
                                        name: column.to_string(),
                                    });
                                }
                                i += 3;
                            }
                            _ => i += 2,
                        }
                        continue;
                    }
                    // alias introduced inside an expression, e.g. CAST(x AS VARCHAR)
                    if i > 0 && tokens[i - 1].is_word("AS") {
                        i += 1;
                        continue;
                    }
                    refs.push(RawRef {
                        qualifier: None,
                        name: word.to_string(),
                    });
                    i += 1;
                }
                _ => i += 1,
            }
        }
        refs
    }

    /// WHERE/ON/HAVING: split into predicates at top-level AND/OR and bind
    /// each single-column predicate to its first placeholder.
    fn predicates(&mut self, tokens: &[Token], scope: &Scope, role: ColumnRole) {
        for predicate in split_predicates(tokens) {
            let placeholder = first_placeholder(predicate);
            let refs = self.references(predicate, scope, Some(role));
            let bound = if refs.len() == 1 { placeholder } else { None };
            for raw in refs {
                self.push_column(scope, raw, role, None, bound.clone());
            }
        }
    }

    // ---- INSERT ----

    fn insert(&mut self, tokens: &[Token]) {
        let Some(into) = find_top_level(tokens, 0, &["INTO"]) else {
            self.missing_insert_columns = true;
            return;
        };
        let mut scope = Scope::default();
        let mut j = into + 1;
        let mut name = None;
        while j < tokens.len() {
            match &tokens[j] {
                t @ (Token::Word(_) | Token::Quoted(_)) => {
                    name = t.ident().map(|s| s.to_lowercase());
                    if tokens.get(j + 1) == Some(&Token::Dot) {
                        j += 2;
                        continue;
                    }
                    j += 1;
                    break;
                }
                Token::Placeholder(_) => {
                    self.dynamic_table = true;
                    return;
                }
                _ => break,
            }
        }
        let Some(name) = name else {
            return;
        };
        // Optional alias before the column list.
        if tokens.get(j).is_some_and(|t| matches!(t, Token::Word(w) if !is_keyword(w))) {
            j += 1;
        }
        self.note_table(&name);
        let table = TableRef { name, alias: None };
        self.table_refs.push(table.clone());
        scope.add(table);

        if tokens.get(j) != Some(&Token::LParen) {
            self.missing_insert_columns = true;
            return;
        }
        let close = matching_paren(tokens, j).unwrap_or(tokens.len());
        let columns: Vec<RawRef> = split_top_level(&tokens[j + 1..close.min(tokens.len())], |t| *t == Token::Comma)
            .into_iter()
            .filter_map(|col| {
                col.iter().rev().find_map(|t| t.ident()).map(|n| RawRef {
                    qualifier: None,
                    name: n.to_string(),
                })
            })
            .collect();
        if columns.is_empty() {
            self.missing_insert_columns = true;
            return;
        }

        let rest = &tokens[(close + 1).min(tokens.len())..];
        let values = find_top_level(rest, 0, &["VALUES"]);
        let select = find_top_level(rest, 0, &["SELECT"]);
        let bindings: Vec<Option<String>> = match (values, select) {
            (Some(v), _) if rest.get(v + 1) == Some(&Token::LParen) => {
                let vclose = matching_paren(rest, v + 1).unwrap_or(rest.len());
                split_top_level(&rest[v + 2..vclose.min(rest.len())], |t| *t == Token::Comma)
                    .into_iter()
                    .map(first_placeholder)
                    .collect()
            }
            (None, Some(s)) => {
                let mut nested = Accumulator::default();
                nested.select(&rest[s..], None);
                self.absorb(nested, None);
                Vec::new()
            }
            _ => Vec::new(),
        };
        for (idx, raw) in columns.into_iter().enumerate() {
            let bound = bindings.get(idx).cloned().flatten();
            self.push_column(&scope, raw, ColumnRole::Written, None, bound);
        }
    }

    // ---- UPDATE ----

    fn update(&mut self, tokens: &[Token]) {
        let Some(set) = find_top_level(tokens, 0, &["SET"]) else {
            return;
        };
        let mut scope = Scope::default();
        self.table_item(&tokens[1..set], &mut scope);
        let where_at = find_top_level(tokens, set + 1, &["WHERE", "RETURNING"]);
        let set_end = where_at.unwrap_or(tokens.len());

        for assignment in split_top_level(&tokens[set + 1..set_end], |t| *t == Token::Comma) {
            let eq = assignment
                .iter()
                .position(|t| matches!(t, Token::Op(o) if o == "="));
            let Some(eq) = eq else {
                continue;
            };
            let target = &assignment[..eq];
            let value = &assignment[eq + 1..];
            let refs = self.references(target, &scope, None);
            let bound = first_placeholder(value);
            // Subqueries on the right-hand side read columns; plain
            // references there are not assignments.
            let _ = self.references(value, &scope, Some(ColumnRole::Filtered));
            for raw in refs {
                self.push_column(&scope, raw, ColumnRole::Written, None, bound.clone());
            }
        }
        if let Some(w) = where_at.filter(|w| tokens[*w].is_word("WHERE")) {
            let end = find_top_level(tokens, w + 1, &["RETURNING"]).unwrap_or(tokens.len());
            self.predicates(&tokens[w + 1..end], &scope, ColumnRole::Filtered);
        }
    }

    // ---- DELETE ----

    fn delete(&mut self, tokens: &[Token]) {
        let mut start = 1;
        if tokens.get(start).is_some_and(|t| t.is_word("FROM")) {
            start += 1;
        }
        let where_at = find_top_level(tokens, start, &["WHERE"]);
        let mut scope = Scope::default();
        self.table_item(&tokens[start.min(tokens.len())..where_at.unwrap_or(tokens.len())], &mut scope);
        if let Some(w) = where_at {
            self.predicates(&tokens[w + 1..], &scope, ColumnRole::Filtered);
        }
    }
}

// ---- Token-slice helpers ----

/// Index of the `)` matching the `(` at `open`.
fn matching_paren(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, t) in tokens.iter().enumerate().skip(open) {
        match t {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// First depth-0 index at or after `from` whose word is in `keywords`.
fn find_top_level(tokens: &[Token], from: usize, keywords: &[&str]) -> Option<usize> {
    let mut depth = 0usize;
    for (i, t) in tokens.iter().enumerate() {
        match t {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            _ if i >= from && depth == 0 && keywords.iter().any(|k| t.is_word(k)) => return Some(i),
            _ => {}
        }
    }
    None
}

fn split_top_level(tokens: &[Token], is_separator: impl Fn(&Token) -> bool) -> Vec<&[Token]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, t) in tokens.iter().enumerate() {
        match t {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            _ if depth == 0 && is_separator(t) => {
                parts.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&tokens[start..]);
    parts
}

fn split_set_operations(tokens: &[Token]) -> Vec<&[Token]> {
    split_top_level(tokens, |t| {
        t.is_word("UNION") || t.is_word("MINUS") || t.is_word("INTERSECT") || t.is_word("EXCEPT")
    })
    .into_iter()
    .map(|part| {
        // UNION ALL leaves ALL at the head of the next part.
        match part.first() {
            Some(t) if t.is_word("ALL") => &part[1..],
            _ => part,
        }
    })
    .filter(|part| !part.is_empty())
    .collect()
}

/// Split at top-level AND/OR, keeping `BETWEEN a AND b` together.
fn split_predicates(tokens: &[Token]) -> Vec<&[Token]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut in_between = false;
    for (i, t) in tokens.iter().enumerate() {
        match t {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            _ if depth == 0 && t.is_word("BETWEEN") => in_between = true,
            _ if depth == 0 && t.is_word("AND") && in_between => in_between = false,
            _ if depth == 0 && (t.is_word("AND") || t.is_word("OR")) => {
                parts.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&tokens[start..]);
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

/// First placeholder outside any subquery.
fn first_placeholder(tokens: &[Token]) -> Option<String> {
    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i] {
            Token::Placeholder(p) => return Some(p.clone()),
            Token::LParen if tokens.get(i + 1).is_some_and(|t| t.is_word("SELECT")) => {
                i = matching_paren(tokens, i).unwrap_or(tokens.len());
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn is_star_item(item: &[Token]) -> bool {
    match item {
        [Token::Star] => true,
        [q, Token::Dot, Token::Star] => q.ident().is_some(),
        _ => false,
    }
}

/// `expr AS alias` or `expr alias` → (expr, alias).
fn split_alias(item: &[Token]) -> (&[Token], Option<String>) {
    let n = item.len();
    if n >= 3 && item[n - 2].is_word("AS") {
        return (&item[..n - 2], item[n - 1].ident().map(str::to_string));
    }
    if n >= 2 {
        if let Token::Word(w) | Token::Quoted(w) = &item[n - 1] {
            let prev = &item[n - 2];
            let prev_allows_alias = matches!(prev, Token::RParen | Token::Word(_) | Token::Quoted(_) | Token::Str | Token::Number)
                && !matches!(prev, Token::Word(p) if is_keyword(p) && !p.eq_ignore_ascii_case("END"));
            if !is_keyword(w) && prev_allows_alias {
                return (&item[..n - 1], Some(w.clone()));
            }
        }
    }
    (item, None)
}

/// Alias following a table name or derived table: `[AS] alias`.
fn alias_after(tokens: &[Token]) -> Option<String> {
    let mut i = 0;
    if tokens.first().is_some_and(|t| t.is_word("AS")) {
        i = 1;
    }
    match tokens.get(i) {
        Some(Token::Word(w)) if !is_keyword(w) => Some(w.clone()),
        Some(Token::Quoted(w)) => Some(w.clone()),
        _ => None,
    }
}
