//! Call-site resolution against the project's own type declarations.
//!
//! Receiver → declared type (field, parameter, local) → qualified class via
//! imports, same package, nesting, wildcard imports and finally a unique
//! simple name. Interface receivers bind to their implementation. Overloads
//! are chosen by argument count, then by argument type; a remaining tie
//! takes the first declaration and is flagged ambiguous.

use applycrypto_core::types::collections::{FxHashMap, FxHashSet};

use crate::parsers::types::{simple_type_name, CallSite, ClassInfo, ClassKind, MethodInfo, ParseResult};

use super::types::{method_id, Resolution};

const MAX_SUPERTYPE_DEPTH: usize = 8;
const IMPL_SUFFIXES: &[&str] = &["Impl", "IMPL", "impl"];

/// Where a call site was found.
#[derive(Clone, Copy)]
pub struct CallContext<'a> {
    pub result: &'a ParseResult,
    pub class: &'a ClassInfo,
    pub method: &'a MethodInfo,
}

/// A method a call site resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodTarget {
    pub id: String,
    pub resolution: Resolution,
    pub ambiguous: bool,
    pub parameters: Vec<String>,
}

/// Outcome of resolving one call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallResolution {
    Method(MethodTarget),
    /// The receiver type is a project class that does not declare the method.
    Undeclared { class: String },
    Unresolved,
}

#[derive(Debug)]
struct MethodEntry {
    name: String,
    id: String,
    parameter_names: Vec<String>,
    parameter_types: Vec<String>,
    varargs: bool,
    line: u32,
}

#[derive(Debug)]
struct ClassEntry {
    kind: ClassKind,
    simple: String,
    supertypes: Vec<String>,
    methods: Vec<MethodEntry>,
}

/// Every declared class with its methods and resolved supertypes.
#[derive(Debug, Default)]
pub struct TypeIndex {
    classes: FxHashMap<String, ClassEntry>,
    by_simple: FxHashMap<String, Vec<String>>,
    implementors: FxHashMap<String, Vec<String>>,
}

impl TypeIndex {
    pub fn build(results: &[ParseResult]) -> Self {
        let mut index = Self::default();
        for result in results {
            for class in &result.classes {
                let methods = class
                    .methods
                    .iter()
                    .map(|m| MethodEntry {
                        name: m.name.clone(),
                        id: method_id(&class.qualified_name, m),
                        parameter_names: m.parameters.iter().map(|p| p.name.clone()).collect(),
                        parameter_types: m.parameters.iter().map(|p| simple_type_name(&p.type_name)).collect(),
                        varargs: m.parameters.last().is_some_and(|p| p.type_name.ends_with("...")),
                        line: m.range.start_line,
                    })
                    .collect();
                index.classes.insert(
                    class.qualified_name.clone(),
                    ClassEntry {
                        kind: class.kind,
                        simple: class.name.rsplit('.').next().unwrap_or(&class.name).to_string(),
                        supertypes: Vec::new(),
                        methods,
                    },
                );
                index
                    .by_simple
                    .entry(class.name.rsplit('.').next().unwrap_or(&class.name).to_string())
                    .or_default()
                    .push(class.qualified_name.clone());
            }
        }
        for names in index.by_simple.values_mut() {
            names.sort();
        }

        // Second pass: supertypes can only be resolved once every class is known.
        for result in results {
            for class in &result.classes {
                let resolved: Vec<String> = class
                    .extends
                    .iter()
                    .chain(class.implements.iter())
                    .filter_map(|t| index.resolve_type_in(t, result, Some(class)))
                    .collect();
                for parent in &resolved {
                    index
                        .implementors
                        .entry(parent.clone())
                        .or_default()
                        .push(class.qualified_name.clone());
                }
                if let Some(entry) = index.classes.get_mut(&class.qualified_name) {
                    entry.supertypes = resolved;
                }
            }
        }
        for impls in index.implementors.values_mut() {
            impls.sort();
            impls.dedup();
        }
        index
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn contains(&self, qualified: &str) -> bool {
        self.classes.contains_key(qualified)
    }

    /// Qualified project class for a type name as written in `result`.
    pub fn resolve_type_in(&self, raw: &str, result: &ParseResult, class: Option<&ClassInfo>) -> Option<String> {
        let base = raw.split('<').next().unwrap_or(raw).trim().trim_end_matches("[]").trim_end_matches("...");
        if base.is_empty() {
            return None;
        }
        if base.contains('.') && self.classes.contains_key(base) {
            return Some(base.to_string());
        }
        let simple = simple_type_name(base);

        let imported = result
            .imported_types()
            .find(|path| path.rsplit('.').next() == Some(simple.as_str()));
        if let Some(path) = imported {
            if self.classes.contains_key(path) {
                return Some(path.to_string());
            }
            return None;
        }
        if let Some(class) = class {
            let nested = format!("{}.{}", class.qualified_name, simple);
            if self.classes.contains_key(&nested) {
                return Some(nested);
            }
        }
        let same_package = match &result.package {
            Some(pkg) => format!("{pkg}.{simple}"),
            None => simple.clone(),
        };
        if self.classes.contains_key(&same_package) {
            return Some(same_package);
        }
        for import in result.imports.iter().filter(|i| i.is_wildcard && !i.is_static) {
            let candidate = format!("{}.{}", import.path, simple);
            if self.classes.contains_key(&candidate) {
                return Some(candidate);
            }
        }
        match self.by_simple.get(&simple).map(Vec::as_slice) {
            Some([only]) => Some(only.clone()),
            _ => None,
        }
    }

    /// Resolve one call site made inside `ctx.method`.
    pub fn resolve_call(&self, ctx: CallContext<'_>, call: &CallSite) -> CallResolution {
        let receiver = call.receiver.as_deref().map(str::trim);
        match receiver {
            None | Some("this") => self.resolve_in_hierarchy(&ctx.class.qualified_name, ctx, call, Resolution::SameClass),
            Some("super") => {
                let supers = self
                    .classes
                    .get(&ctx.class.qualified_name)
                    .map(|c| c.supertypes.clone())
                    .unwrap_or_default();
                for parent in supers {
                    if let CallResolution::Method(target) =
                        self.resolve_in_hierarchy(&parent, ctx, call, Resolution::SameClass)
                    {
                        return CallResolution::Method(target);
                    }
                }
                CallResolution::Unresolved
            }
            Some(expr) => {
                let variable = expr.strip_prefix("this.").unwrap_or(expr);
                if is_identifier(variable) {
                    let declared = ctx
                        .method
                        .variable_type(variable)
                        .or_else(|| ctx.class.field(variable).map(|f| f.type_name.as_str()));
                    if let Some(declared) = declared {
                        return match self.resolve_type_in(declared, ctx.result, Some(ctx.class)) {
                            Some(class) => self.resolve_on_type(&class, ctx, call, Resolution::ReceiverType),
                            None => CallResolution::Unresolved,
                        };
                    }
                }
                if looks_like_type(expr) {
                    if let Some(class) = self.resolve_type_in(expr, ctx.result, Some(ctx.class)) {
                        return self.resolve_on_type(&class, ctx, call, Resolution::StaticType);
                    }
                }
                CallResolution::Unresolved
            }
        }
    }

    /// Resolve against a receiver type, binding interfaces to their implementation.
    fn resolve_on_type(&self, class: &str, ctx: CallContext<'_>, call: &CallSite, resolution: Resolution) -> CallResolution {
        let is_abstract_type = self
            .classes
            .get(class)
            .is_some_and(|c| c.kind == ClassKind::Interface);
        if is_abstract_type {
            for implementation in self.implementations_of(class) {
                if let CallResolution::Method(target) =
                    self.resolve_in_hierarchy(&implementation, ctx, call, Resolution::Implementation)
                {
                    return CallResolution::Method(target);
                }
            }
        }
        match self.resolve_in_hierarchy(class, ctx, call, resolution) {
            CallResolution::Method(target) => CallResolution::Method(target),
            _ => CallResolution::Undeclared {
                class: class.to_string(),
            },
        }
    }

    /// Implementation candidates: declared implementors first, then naming.
    fn implementations_of(&self, interface: &str) -> Vec<String> {
        let mut out: Vec<String> = self.implementors.get(interface).cloned().unwrap_or_default();
        let Some(entry) = self.classes.get(interface) else {
            return out;
        };
        let simple = entry.simple.as_str();
        let stem = match simple.strip_prefix('I') {
            Some(rest) if rest.starts_with(|c: char| c.is_ascii_uppercase()) => rest,
            _ => simple,
        };
        let mut names: Vec<String> = IMPL_SUFFIXES.iter().map(|s| format!("{stem}{s}")).collect();
        if stem != simple {
            names.push(stem.to_string());
        }
        for name in names {
            for qualified in self.by_simple.get(&name).into_iter().flatten() {
                let is_class = self.classes.get(qualified).is_some_and(|c| c.kind == ClassKind::Class);
                if is_class && !out.contains(qualified) {
                    out.push(qualified.clone());
                }
            }
        }
        out
    }

    /// Find the method on `class` or, failing that, its supertypes.
    fn resolve_in_hierarchy(&self, class: &str, ctx: CallContext<'_>, call: &CallSite, resolution: Resolution) -> CallResolution {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut frontier: Vec<&str> = vec![class];
        for _ in 0..MAX_SUPERTYPE_DEPTH {
            let mut next = Vec::new();
            for name in frontier {
                if !seen.insert(name) {
                    continue;
                }
                let Some(entry) = self.classes.get(name) else {
                    continue;
                };
                if let Some(target) = select_overload(entry, ctx, call, resolution) {
                    return CallResolution::Method(target);
                }
                next.extend(entry.supertypes.iter().map(String::as_str));
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        CallResolution::Unresolved
    }
}

/// Count first, then type match, then first declaration (flagged ambiguous).
fn select_overload(entry: &ClassEntry, ctx: CallContext<'_>, call: &CallSite, resolution: Resolution) -> Option<MethodTarget> {
    let mut named: Vec<&MethodEntry> = entry.methods.iter().filter(|m| m.name == call.callee_name).collect();
    if named.is_empty() {
        return None;
    }
    named.sort_by_key(|m| m.line);

    let argc = call.arguments.len();
    let by_count: Vec<&MethodEntry> = named
        .iter()
        .copied()
        .filter(|m| {
            m.parameter_types.len() == argc || (m.varargs && argc + 1 >= m.parameter_types.len())
        })
        .collect();

    let (chosen, ambiguous) = match by_count.len() {
        0 => (named[0], true),
        1 => (by_count[0], false),
        _ => {
            let argument_types: Vec<Option<String>> =
                call.arguments.iter().map(|a| argument_type(a, ctx)).collect();
            let scores: Vec<usize> = by_count
                .iter()
                .map(|m| {
                    m.parameter_types
                        .iter()
                        .zip(&argument_types)
                        .filter(|(p, a)| a.as_deref() == Some(p.as_str()))
                        .count()
                })
                .collect();
            let best = scores.iter().copied().max().unwrap_or(0);
            let winners: Vec<usize> = (0..by_count.len()).filter(|&i| scores[i] == best).collect();
            match winners.as_slice() {
                [only] => (by_count[*only], false),
                _ => (by_count[winners.first().copied().unwrap_or(0)], true),
            }
        }
    };

    if ambiguous {
        tracing::debug!(
            call = %call.qualified_text(),
            chosen = %chosen.id,
            line = call.line,
            "ambiguous overload resolution"
        );
    }
    Some(MethodTarget {
        id: chosen.id.clone(),
        resolution,
        ambiguous,
        parameters: chosen.parameter_names.clone(),
    })
}

/// Best-effort static type of an argument expression.
fn argument_type(expr: &str, ctx: CallContext<'_>) -> Option<String> {
    let expr = expr.trim();
    if expr.starts_with('"') {
        return Some("String".to_string());
    }
    if expr.starts_with('\'') {
        return Some("char".to_string());
    }
    if expr == "true" || expr == "false" {
        return Some("boolean".to_string());
    }
    if let Some(first) = expr.chars().next() {
        if first.is_ascii_digit() || (first == '-' && expr.len() > 1) {
            let upper = expr.to_ascii_uppercase();
            return Some(if upper.ends_with('L') {
                "long"
            } else if upper.contains('.') || upper.ends_with('D') || upper.ends_with('F') {
                "double"
            } else {
                "int"
            }
            .to_string());
        }
    }
    if let Some(rest) = expr.strip_prefix("new ") {
        let ty = rest.split(['(', '[', '{']).next().unwrap_or(rest);
        return Some(simple_type_name(ty));
    }
    let variable = expr.strip_prefix("this.").unwrap_or(expr);
    if is_identifier(variable) {
        return ctx
            .method
            .variable_type(variable)
            .or_else(|| ctx.class.field(variable).map(|f| f.type_name.as_str()))
            .map(simple_type_name);
    }
    None
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// `EmpUtil` or `com.acme.EmpUtil`: last segment starts upper-case.
fn looks_like_type(text: &str) -> bool {
    text.split('.').all(is_identifier)
        && text
            .rsplit('.')
            .next()
            .and_then(|s| s.chars().next())
            .is_some_and(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_and_type_shapes() {
        assert!(is_identifier("empDao"));
        assert!(!is_identifier("getDao()"));
        assert!(looks_like_type("EmpUtil"));
        assert!(looks_like_type("com.acme.EmpUtil"));
        assert!(!looks_like_type("empDao"));
    }
}
