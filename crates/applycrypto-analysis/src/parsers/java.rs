//! Java symbol extractor built on tree-sitter.
//!
//! Walks the concrete syntax tree once per class body and records
//! declarations, annotations, call sites with argument text, local
//! variable types, and strings assembled for SQL.

use std::path::Path;
use std::time::Instant;

use applycrypto_core::errors::ParseError;
use applycrypto_core::types::collections::FxHashMap;
use smallvec::SmallVec;
use tree_sitter::{Node, Parser};

use super::error_tolerant::syntax_faults;
use super::traits::ArtifactParser;
use super::types::*;
use crate::scanner::hasher::hash_content;
use crate::scanner::language_detect::ArtifactKind;
use crate::scanner::types::SourceArtifact;

pub struct JavaExtractor;

impl Default for JavaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl JavaExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactParser for JavaExtractor {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::JavaSource
    }

    fn parse(&self, artifact: &SourceArtifact) -> Result<ParseResult, ParseError> {
        parse_java(artifact.content.as_bytes(), artifact.path())
    }
}

/// Parse one Java compilation unit.
///
/// Trees with ERROR nodes still yield every declaration tree-sitter
/// recovered; the result is flagged `has_errors`.
pub fn parse_java(source: &[u8], path: &Path) -> Result<ParseResult, ParseError> {
    let start = Instant::now();
    let file = path.to_string_lossy().replace('\\', "/");

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .map_err(|_| ParseError::GrammarNotFound {
            language: "java".to_string(),
        })?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseError::TreeSitterError {
            path: path.to_path_buf(),
            message: "tree-sitter returned None".to_string(),
        })?;

    let root = tree.root_node();
    let faults = syntax_faults(root);

    let mut result = ParseResult {
        file,
        kind: ArtifactKind::JavaSource,
        content_hash: hash_content(source),
        has_errors: !faults.is_clean(),
        error_count: faults.count,
        error_detail: faults.detail(),
        ..Default::default()
    };

    for i in 0..root.named_child_count() {
        let Some(child) = root.named_child(i) else {
            continue;
        };
        match child.kind() {
            "package_declaration" => {
                result.package = find_child_text(&child, source, &["scoped_identifier", "identifier"]);
            }
            "import_declaration" => {
                if let Some(import) = extract_import(child, source) {
                    result.imports.push(import);
                }
            }
            "class_declaration" | "interface_declaration" | "enum_declaration" => {
                let package = result.package.clone();
                extract_type_declaration(child, source, package.as_deref(), None, &mut result.classes);
            }
            _ => {}
        }
    }

    result.parse_time_us = start.elapsed().as_micros() as u64;
    Ok(result)
}

fn extract_import(node: Node, source: &[u8]) -> Option<ImportInfo> {
    let text = node_text(node, source);
    let body = text
        .trim()
        .trim_start_matches("import")
        .trim()
        .trim_end_matches(';')
        .trim();
    let (is_static, body) = match body.strip_prefix("static") {
        Some(rest) => (true, rest.trim()),
        None => (false, body),
    };
    let (is_wildcard, path) = match body.strip_suffix(".*") {
        Some(p) => (true, p),
        None => (false, body),
    };
    let path: String = path.chars().filter(|c| !c.is_whitespace()).collect();
    if path.is_empty() {
        return None;
    }
    Some(ImportInfo {
        path,
        is_static,
        is_wildcard,
        line: line_of(&node),
    })
}

/// Extract a class/interface/enum and, recursively, its nested types.
fn extract_type_declaration(
    node: Node,
    source: &[u8],
    package: Option<&str>,
    outer: Option<&str>,
    out: &mut Vec<ClassInfo>,
) {
    let Some(name) = node.child_by_field_name("name").map(|n| node_text(n, source)) else {
        return;
    };
    let kind = match node.kind() {
        "interface_declaration" => ClassKind::Interface,
        "enum_declaration" => ClassKind::Enum,
        _ => ClassKind::Class,
    };
    let nested_name = match outer {
        Some(o) => format!("{o}.{name}"),
        None => name.clone(),
    };
    let qualified_name = match package {
        Some(p) if !p.is_empty() => format!("{p}.{nested_name}"),
        _ => nested_name.clone(),
    };

    let mut extends: SmallVec<[String; 1]> = SmallVec::new();
    let mut implements: SmallVec<[String; 2]> = SmallVec::new();
    if let Some(sup) = node.child_by_field_name("superclass") {
        collect_types(sup, source, &mut extends);
    }
    if let Some(ifaces) = node.child_by_field_name("interfaces") {
        collect_types(ifaces, source, &mut implements);
    }
    // interface Foo extends Bar, Baz
    if let Some(ext) = find_child_by_kind(&node, "extends_interfaces") {
        collect_types(ext, source, &mut extends);
    }

    let annotations = modifiers_of(&node)
        .map(|m| extract_annotations(m, source))
        .unwrap_or_default();

    let mut class = ClassInfo {
        name,
        qualified_name,
        kind,
        extends,
        implements,
        annotations,
        fields: Vec::new(),
        methods: Vec::new(),
        range: Range::from_ts_node(&node),
    };

    let mut nested = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        // Fields first so method bodies can evaluate class constants.
        for i in 0..body.named_child_count() {
            let Some(member) = body.named_child(i) else {
                continue;
            };
            if matches!(member.kind(), "field_declaration" | "constant_declaration") {
                extract_fields(member, source, &mut class.fields);
            }
        }
        let constants: FxHashMap<String, String> = class
            .fields
            .iter()
            .filter_map(|f| f.constant_value.clone().map(|v| (f.name.clone(), v)))
            .collect();

        for i in 0..body.named_child_count() {
            let Some(member) = body.named_child(i) else {
                continue;
            };
            match member.kind() {
                "method_declaration" | "constructor_declaration" => {
                    let in_interface = kind == ClassKind::Interface;
                    if let Some(method) = extract_method(member, source, &constants, in_interface) {
                        class.methods.push(method);
                    }
                }
                "class_declaration" | "interface_declaration" | "enum_declaration" => {
                    nested.push(member);
                }
                // enum constants followed by a body declaration list
                "enum_body_declarations" => {
                    for j in 0..member.named_child_count() {
                        if let Some(m) = member.named_child(j) {
                            if matches!(m.kind(), "method_declaration" | "constructor_declaration") {
                                if let Some(method) = extract_method(m, source, &constants, false) {
                                    class.methods.push(method);
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    out.push(class);
    for n in nested {
        extract_type_declaration(n, source, package, Some(&nested_name), out);
    }
}

fn collect_types<A: smallvec::Array<Item = String>>(node: Node, source: &[u8], out: &mut SmallVec<A>) {
    for i in 0..node.named_child_count() {
        let Some(child) = node.named_child(i) else {
            continue;
        };
        match child.kind() {
            "type_list" => collect_types(child, source, out),
            "type_identifier" | "generic_type" | "scoped_type_identifier" => {
                out.push(node_text(child, source));
            }
            _ => {}
        }
    }
}

fn extract_fields(node: Node, source: &[u8], out: &mut Vec<FieldInfo>) {
    let type_name = node
        .child_by_field_name("type")
        .map(|t| node_text(t, source))
        .unwrap_or_default();
    let annotations = modifiers_of(&node)
        .map(|m| extract_annotations(m, source))
        .unwrap_or_default();
    let empty = FxHashMap::default();

    let mut cursor = node.walk();
    for declarator in node.children_by_field_name("declarator", &mut cursor) {
        let Some(name) = declarator.child_by_field_name("name").map(|n| node_text(n, source)) else {
            continue;
        };
        let constant_value = declarator
            .child_by_field_name("value")
            .and_then(|v| eval_string(v, source, &empty, &empty));
        out.push(FieldInfo {
            name,
            type_name: type_name.clone(),
            annotations: annotations.clone(),
            constant_value,
            line: line_of(&declarator),
        });
    }
}

fn extract_method(
    node: Node,
    source: &[u8],
    constants: &FxHashMap<String, String>,
    in_interface: bool,
) -> Option<MethodInfo> {
    let name = node.child_by_field_name("name").map(|n| node_text(n, source))?;
    let is_constructor = node.kind() == "constructor_declaration";
    let modifiers = modifiers_of(&node);
    let modifier_text = modifiers.map(|m| node_text(m, source)).unwrap_or_default();
    let annotations = modifiers
        .map(|m| extract_annotations(m, source))
        .unwrap_or_default();
    let body = node.child_by_field_name("body");

    let mut method = MethodInfo {
        name,
        parameters: node
            .child_by_field_name("parameters")
            .map(|p| extract_parameters(p, source))
            .unwrap_or_default(),
        return_type: if is_constructor {
            None
        } else {
            node.child_by_field_name("type").map(|t| node_text(t, source))
        },
        annotations,
        is_constructor,
        is_public: in_interface || has_keyword(&modifier_text, "public"),
        is_static: has_keyword(&modifier_text, "static"),
        has_body: body.is_some(),
        locals: Vec::new(),
        call_sites: Vec::new(),
        built_strings: Vec::new(),
        range: Range::from_ts_node(&node),
    };

    if let Some(body) = body {
        let mut walker = BodyWalker {
            source,
            constants,
            strings: FxHashMap::default(),
            string_lines: FxHashMap::default(),
            string_order: Vec::new(),
            method: &mut method,
            returned: Vec::new(),
        };
        walker.walk(body);
        walker.finish();
        method
            .call_sites
            .sort_by(|a, b| (a.line, a.column).cmp(&(b.line, b.column)));
    }
    Some(method)
}

fn extract_parameters(node: Node, source: &[u8]) -> SmallVec<[ParameterInfo; 4]> {
    let mut params = SmallVec::new();
    for i in 0..node.named_child_count() {
        let Some(param) = node.named_child(i) else {
            continue;
        };
        match param.kind() {
            "formal_parameter" => {
                let name = param
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source))
                    .unwrap_or_default();
                let type_name = param
                    .child_by_field_name("type")
                    .map(|t| node_text(t, source))
                    .unwrap_or_default();
                params.push(ParameterInfo {
                    name,
                    type_name,
                    annotations: modifiers_of(&param)
                        .map(|m| extract_annotations(m, source).into_iter().collect())
                        .unwrap_or_default(),
                });
            }
            "spread_parameter" => {
                let type_name = find_child_text(
                    &param,
                    source,
                    &["type_identifier", "generic_type", "scoped_type_identifier"],
                )
                .unwrap_or_default();
                let name = find_child_by_kind(&param, "variable_declarator")
                    .and_then(|d| d.child_by_field_name("name"))
                    .map(|n| node_text(n, source))
                    .unwrap_or_default();
                params.push(ParameterInfo {
                    name,
                    type_name: format!("{type_name}..."),
                    annotations: SmallVec::new(),
                });
            }
            _ => {}
        }
    }
    params
}

fn modifiers_of<'a>(node: &Node<'a>) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "modifiers");
    found
}

fn has_keyword(modifiers: &str, keyword: &str) -> bool {
    modifiers.split_whitespace().any(|w| w == keyword)
}

fn extract_annotations(modifiers: Node, source: &[u8]) -> Vec<AnnotationInfo> {
    let mut annotations = Vec::new();
    for i in 0..modifiers.named_child_count() {
        let Some(child) = modifiers.named_child(i) else {
            continue;
        };
        if matches!(child.kind(), "annotation" | "marker_annotation") {
            if let Some(a) = extract_annotation(child, source) {
                annotations.push(a);
            }
        }
    }
    annotations
}

fn extract_annotation(node: Node, source: &[u8]) -> Option<AnnotationInfo> {
    let raw_name = node.child_by_field_name("name").map(|n| node_text(n, source))?;
    let name = raw_name.rsplit('.').next().unwrap_or(&raw_name).to_string();

    let mut arguments = SmallVec::new();
    if let Some(args) = node.child_by_field_name("arguments") {
        for i in 0..args.named_child_count() {
            let Some(arg) = args.named_child(i) else {
                continue;
            };
            if arg.kind() == "element_value_pair" {
                let key = arg.child_by_field_name("key").map(|k| node_text(k, source));
                let values = arg
                    .child_by_field_name("value")
                    .map(|v| element_values(v, source))
                    .unwrap_or_default();
                arguments.push(AnnotationArgument { key, values });
            } else if arg.kind() != "comment" {
                arguments.push(AnnotationArgument {
                    key: None,
                    values: element_values(arg, source),
                });
            }
        }
    }

    Some(AnnotationInfo {
        name,
        arguments,
        line: line_of(&node),
    })
}

fn element_values(node: Node, source: &[u8]) -> SmallVec<[String; 1]> {
    let empty = FxHashMap::default();
    if node.kind() == "element_value_array_initializer" {
        let mut values = SmallVec::new();
        for i in 0..node.named_child_count() {
            if let Some(v) = node.named_child(i) {
                values.extend(element_values(v, source));
            }
        }
        return values;
    }
    let value = eval_string(node, source, &empty, &empty).unwrap_or_else(|| node_text(node, source));
    let mut values = SmallVec::new();
    values.push(value);
    values
}

/// Per-method body walk.
///
/// Post-order so that `sb.append("a").append("b")` appends in source order
/// and a declaration's initializer is visible before its name is bound.
struct BodyWalker<'s, 'm> {
    source: &'s [u8],
    constants: &'s FxHashMap<String, String>,
    /// Current statically-known value of each string or builder variable.
    strings: FxHashMap<String, String>,
    string_lines: FxHashMap<String, u32>,
    string_order: Vec<String>,
    method: &'m mut MethodInfo,
    /// Variables returned as-is, with the position of the `return`.
    returned: Vec<(String, (u32, u32))>,
}

impl BodyWalker<'_, '_> {
    fn walk(&mut self, node: Node) {
        // Anonymous classes have their own methods.
        if node.kind() == "class_body" {
            return;
        }
        for i in 0..node.named_child_count() {
            if let Some(child) = node.named_child(i) {
                self.walk(child);
            }
        }
        match node.kind() {
            "local_variable_declaration" => self.on_local_declaration(node),
            "enhanced_for_statement" => self.on_enhanced_for(node),
            "catch_formal_parameter" => self.on_catch_parameter(node),
            "assignment_expression" => self.on_assignment(node),
            "method_invocation" => self.on_invocation(node),
            "return_statement" => self.on_return(node),
            _ => {}
        }
    }

    fn on_local_declaration(&mut self, node: Node) {
        let type_name = node
            .child_by_field_name("type")
            .map(|t| node_text(t, self.source))
            .unwrap_or_default();
        let is_stringy = is_string_type(&type_name);
        let mut cursor = node.walk();
        let declarators: Vec<Node> = node.children_by_field_name("declarator", &mut cursor).collect();
        for declarator in declarators {
            let Some(name) = declarator
                .child_by_field_name("name")
                .map(|n| node_text(n, self.source))
            else {
                continue;
            };
            let line = line_of(&declarator);
            self.method.locals.push(LocalVariable {
                name: name.clone(),
                type_name: type_name.clone(),
                line,
            });
            if !is_stringy {
                continue;
            }
            let value = declarator.child_by_field_name("value").and_then(|v| {
                if v.kind() == "object_creation_expression" {
                    // new StringBuilder("...") or new StringBuilder()
                    let arg = v
                        .child_by_field_name("arguments")
                        .and_then(|a| a.named_child(0));
                    match arg {
                        Some(a) => self.eval(a),
                        None => Some(String::new()),
                    }
                } else {
                    self.eval(v)
                }
            });
            if let Some(value) = value {
                self.bind_string(name, value, line);
            }
        }
    }

    fn on_enhanced_for(&mut self, node: Node) {
        let type_name = node.child_by_field_name("type").map(|t| node_text(t, self.source));
        let name = node.child_by_field_name("name").map(|n| node_text(n, self.source));
        if let (Some(type_name), Some(name)) = (type_name, name) {
            self.method.locals.push(LocalVariable {
                name,
                type_name,
                line: line_of(&node),
            });
        }
    }

    fn on_catch_parameter(&mut self, node: Node) {
        let type_name = find_child_by_kind(&node, "catch_type").map(|t| node_text(t, self.source));
        let name = node.child_by_field_name("name").map(|n| node_text(n, self.source));
        if let (Some(type_name), Some(name)) = (type_name, name) {
            self.method.locals.push(LocalVariable {
                name,
                type_name,
                line: line_of(&node),
            });
        }
    }

    fn on_assignment(&mut self, node: Node) {
        let Some(left) = node.child_by_field_name("left") else {
            return;
        };
        if left.kind() != "identifier" {
            return;
        }
        let name = node_text(left, self.source);
        if !self.strings.contains_key(&name) {
            return;
        }
        let operator = node
            .child_by_field_name("operator")
            .map(|o| node_text(o, self.source))
            .unwrap_or_default();
        let Some(right) = node.child_by_field_name("right").and_then(|r| self.eval(r)) else {
            return;
        };
        if let Some(current) = self.strings.get_mut(&name) {
            if operator == "+=" {
                current.push_str(&right);
            } else {
                *current = right;
            }
        }
    }

    fn on_invocation(&mut self, node: Node) {
        let Some(callee_name) = node
            .child_by_field_name("name")
            .map(|n| node_text(n, self.source))
        else {
            return;
        };
        let object = node.child_by_field_name("object");
        let receiver = object.map(|o| node_text(o, self.source));

        let mut arguments: SmallVec<[String; 4]> = SmallVec::new();
        let mut static_arguments: SmallVec<[Option<String>; 4]> = SmallVec::new();
        if let Some(args) = node.child_by_field_name("arguments") {
            for i in 0..args.named_child_count() {
                let Some(arg) = args.named_child(i) else {
                    continue;
                };
                if arg.kind() == "comment" {
                    continue;
                }
                arguments.push(node_text(arg, self.source));
                static_arguments.push(self.eval(arg));
            }
        }

        // Builder appends mutate the tracked value of the chain's root variable.
        if callee_name == "append" {
            if let (Some(root), Some(value)) = (
                object.and_then(|o| chain_root(o, self.source)),
                static_arguments.first().cloned().flatten(),
            ) {
                if let Some(current) = self.strings.get_mut(&root) {
                    current.push_str(&value);
                }
            }
        }

        let used = result_use(node, self.source);
        let pos = node.start_position();
        self.method.call_sites.push(CallSite {
            callee_name,
            receiver,
            arguments,
            static_arguments,
            assigned_to: used.assigned_to,
            is_returned: used.is_returned,
            argument_of: used.argument_of,
            line: pos.row as u32 + 1,
            column: pos.column as u32,
        });
    }

    fn on_return(&mut self, node: Node) {
        let Some(mut value) = node.named_child(0) else {
            return;
        };
        while matches!(value.kind(), "parenthesized_expression" | "cast_expression") {
            let inner = if value.kind() == "cast_expression" {
                value.child_by_field_name("value")
            } else {
                value.named_child(0)
            };
            match inner {
                Some(inner) => value = inner,
                None => return,
            }
        }
        if value.kind() == "identifier" {
            let pos = node.start_position();
            self.returned
                .push((node_text(value, self.source), (pos.row as u32 + 1, pos.column as u32)));
        }
    }

    fn bind_string(&mut self, name: String, value: String, line: u32) {
        if !self.strings.contains_key(&name) {
            self.string_order.push(name.clone());
            self.string_lines.insert(name.clone(), line);
        }
        self.strings.insert(name, value);
    }

    fn eval(&self, node: Node) -> Option<String> {
        eval_string(node, self.source, self.constants, &self.strings)
    }

    fn finish(self) {
        // `X v = call(); ... return v;` returns the call's result.
        for call in self.method.call_sites.iter_mut() {
            let Some(var) = call.assigned_to.as_deref() else {
                continue;
            };
            let at = (call.line, call.column);
            if self.returned.iter().any(|(name, pos)| name == var && *pos > at) {
                call.is_returned = true;
            }
        }
        for name in self.string_order {
            let line = self.string_lines.get(&name).copied().unwrap_or(0);
            if let Some(text) = self.strings.get(&name) {
                if !text.trim().is_empty() {
                    self.method.built_strings.push(BuiltString {
                        variable: name,
                        text: text.clone(),
                        line,
                    });
                }
            }
        }
    }
}

fn is_string_type(type_name: &str) -> bool {
    matches!(
        simple_type_name(type_name).as_str(),
        "String" | "StringBuilder" | "StringBuffer"
    )
}

/// Identifier at the root of a call chain: `sb.append(a).append(b)` → `sb`.
fn chain_root(mut node: Node, source: &[u8]) -> Option<String> {
    loop {
        match node.kind() {
            "identifier" => return Some(node_text(node, source)),
            "method_invocation" => node = node.child_by_field_name("object")?,
            "parenthesized_expression" => node = node.named_child(0)?,
            _ => return None,
        }
    }
}

#[derive(Default)]
struct ResultUse {
    assigned_to: Option<String>,
    is_returned: bool,
    argument_of: Option<(u32, u32)>,
}

/// Where the value of a call ends up: the variable it is stored in, a
/// direct `return`, or the argument list of an enclosing call.
fn result_use(node: Node, source: &[u8]) -> ResultUse {
    let mut current = node;
    while let Some(parent) = current.parent() {
        match parent.kind() {
            "cast_expression" | "parenthesized_expression" => current = parent,
            "variable_declarator" => {
                return ResultUse {
                    assigned_to: parent.child_by_field_name("name").map(|n| node_text(n, source)),
                    ..Default::default()
                };
            }
            "assignment_expression" => {
                let is_right = parent
                    .child_by_field_name("right")
                    .is_some_and(|r| r.id() == current.id());
                if !is_right {
                    return ResultUse::default();
                }
                return ResultUse {
                    assigned_to: parent.child_by_field_name("left").map(|n| node_text(n, source)),
                    ..Default::default()
                };
            }
            "return_statement" => {
                return ResultUse {
                    is_returned: true,
                    ..Default::default()
                };
            }
            "argument_list" => {
                let argument_of = parent
                    .parent()
                    .filter(|outer| outer.kind() == "method_invocation")
                    .map(|outer| {
                        let pos = outer.start_position();
                        (pos.row as u32 + 1, pos.column as u32)
                    });
                return ResultUse {
                    argument_of,
                    ..Default::default()
                };
            }
            _ => return ResultUse::default(),
        }
    }
    ResultUse::default()
}

/// Statically evaluate a string-valued expression.
///
/// Handles literals, text blocks, `+` concatenation, parenthesized
/// expressions, local string variables, and class constants referenced as
/// `NAME`, `this.NAME` or `Type.NAME`. Anything else is unknown.
fn eval_string(
    node: Node,
    source: &[u8],
    constants: &FxHashMap<String, String>,
    locals: &FxHashMap<String, String>,
) -> Option<String> {
    match node.kind() {
        "string_literal" => Some(unquote(&node_text(node, source))),
        "character_literal" => Some(unquote(&node_text(node, source))),
        "parenthesized_expression" => node
            .named_child(0)
            .and_then(|c| eval_string(c, source, constants, locals)),
        "binary_expression" => {
            let op = node
                .child_by_field_name("operator")
                .map(|o| node_text(o, source))?;
            if op != "+" {
                return None;
            }
            let left = eval_string(node.child_by_field_name("left")?, source, constants, locals)?;
            let right = eval_string(node.child_by_field_name("right")?, source, constants, locals)?;
            Some(left + &right)
        }
        "identifier" => {
            let name = node_text(node, source);
            locals
                .get(&name)
                .or_else(|| constants.get(&name))
                .cloned()
        }
        "field_access" => {
            let field = node.child_by_field_name("field").map(|f| node_text(f, source))?;
            constants.get(&field).cloned()
        }
        "method_invocation" => {
            // sb.toString()
            let name = node.child_by_field_name("name").map(|n| node_text(n, source))?;
            if name != "toString" {
                return None;
            }
            let object = node.child_by_field_name("object")?;
            if object.kind() == "identifier" {
                locals.get(&node_text(object, source)).cloned()
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Strip Java quotes and decode the common escapes.
fn unquote(text: &str) -> String {
    let inner = if let Some(block) = text.strip_prefix("\"\"\"").and_then(|t| t.strip_suffix("\"\"\"")) {
        block
    } else {
        text.trim_matches(|c| c == '"' || c == '\'')
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

// ---- Utility functions ----

fn line_of(node: &Node) -> u32 {
    node.start_position().row as u32 + 1
}

fn node_text(node: Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").to_string()
}

fn find_child_text(node: &Node, source: &[u8], kinds: &[&str]) -> Option<String> {
    let child_count = node.child_count();
    for i in 0..child_count {
        if let Some(child) = node.child(i) {
            if kinds.contains(&child.kind()) {
                let text = node_text(child, source);
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

fn find_child_by_kind<'a>(node: &Node<'a>, kind: &str) -> Option<Node<'a>> {
    let child_count = node.child_count();
    for i in 0..child_count {
        if let Some(child) = node.child(i) {
            if child.kind() == kind {
                return Some(child);
            }
        }
    }
    None
}
