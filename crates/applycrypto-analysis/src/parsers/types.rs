//! Canonical ParseResult and supporting types.
//!
//! The language-neutral structural model every extractor produces. Java
//! sources fill `package`, `imports` and `classes`; mapper XML fills `mapper`.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::scanner::language_detect::ArtifactKind;

/// Canonical parse result produced by every extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseResult {
    pub file: String,
    pub kind: ArtifactKind,
    pub content_hash: u64,

    // Procedural structure
    pub package: Option<String>,
    pub imports: Vec<ImportInfo>,
    pub classes: Vec<ClassInfo>,

    // Declarative queries
    pub mapper: Option<MapperInfo>,

    // Metadata
    pub parse_time_us: u64,
    pub error_count: u32,
    pub has_errors: bool,
    /// First problem seen when the result is partial.
    pub error_detail: Option<String>,
}

impl Default for ParseResult {
    fn default() -> Self {
        Self {
            file: String::new(),
            kind: ArtifactKind::Other,
            content_hash: 0,
            package: None,
            imports: Vec::new(),
            classes: Vec::new(),
            mapper: None,
            parse_time_us: 0,
            error_count: 0,
            has_errors: false,
            error_detail: None,
        }
    }
}

impl ParseResult {
    /// Iterate every method of every class in the file.
    pub fn methods(&self) -> impl Iterator<Item = (&ClassInfo, &MethodInfo)> {
        self.classes
            .iter()
            .flat_map(|c| c.methods.iter().map(move |m| (c, m)))
    }

    /// Fully qualified names this file imports explicitly (not wildcards).
    pub fn imported_types(&self) -> impl Iterator<Item = &str> {
        self.imports
            .iter()
            .filter(|i| !i.is_wildcard && !i.is_static)
            .map(|i| i.path.as_str())
    }
}

/// A Java import declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportInfo {
    /// Dotted path without the trailing `.*`.
    pub path: String,
    pub is_static: bool,
    pub is_wildcard: bool,
    pub line: u32,
}

/// An annotation with its arguments, e.g. `@GetMapping(value = "/emp", produces = "json")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationInfo {
    /// Simple name without `@` or package qualifier.
    pub name: String,
    pub arguments: SmallVec<[AnnotationArgument; 2]>,
    pub line: u32,
}

/// One annotation argument; `key` is `None` for the single unnamed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationArgument {
    pub key: Option<String>,
    /// String literals unquoted, arrays flattened, other expressions verbatim.
    pub values: SmallVec<[String; 1]>,
}

impl AnnotationInfo {
    /// Values of the argument named `key`, treating the unnamed argument as `value`.
    pub fn argument(&self, key: &str) -> Option<&[String]> {
        self.arguments
            .iter()
            .find(|a| match &a.key {
                Some(k) => k == key,
                None => key == "value",
            })
            .map(|a| a.values.as_slice())
    }

    /// First value of `value`, falling back to `path` (Spring aliases them).
    pub fn primary_value(&self) -> Option<&str> {
        self.argument("value")
            .or_else(|| self.argument("path"))
            .and_then(|v| v.first())
            .map(|s| s.as_str())
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }
}

/// Does any annotation in the list carry `name`?
pub fn has_annotation(annotations: &[AnnotationInfo], name: &str) -> bool {
    annotations.iter().any(|a| a.name == name)
}

/// Find an annotation by simple name.
pub fn find_annotation<'a>(annotations: &'a [AnnotationInfo], name: &str) -> Option<&'a AnnotationInfo> {
    annotations.iter().find(|a| a.name == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
}

/// A class, interface or enum declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    /// `package.Outer.Name`.
    pub qualified_name: String,
    pub kind: ClassKind,
    /// Raw supertype text including type arguments.
    pub extends: SmallVec<[String; 1]>,
    pub implements: SmallVec<[String; 2]>,
    pub annotations: Vec<AnnotationInfo>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub range: Range,
}

impl ClassInfo {
    /// String constant declared on this class, e.g. `NAMESPACE`.
    pub fn constant(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.constant_value.as_deref())
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Simple names of every supertype (extends and implements).
    pub fn supertypes(&self) -> impl Iterator<Item = String> + '_ {
        self.extends
            .iter()
            .chain(self.implements.iter())
            .map(|t| simple_type_name(t))
    }
}

/// A field declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    pub type_name: String,
    pub annotations: Vec<AnnotationInfo>,
    /// Statically known string value of the initializer.
    pub constant_value: Option<String>,
    pub line: u32,
}

/// A formal parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub name: String,
    pub type_name: String,
    pub annotations: SmallVec<[AnnotationInfo; 1]>,
}

/// A local variable visible in a method body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalVariable {
    pub name: String,
    pub type_name: String,
    pub line: u32,
}

/// A string assembled in a method body from literals, constants,
/// `+`/`+=` concatenation and `append` chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltString {
    pub variable: String,
    pub text: String,
    /// Line of the declaration.
    pub line: u32,
}

/// A method or constructor declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    pub parameters: SmallVec<[ParameterInfo; 4]>,
    pub return_type: Option<String>,
    pub annotations: Vec<AnnotationInfo>,
    pub is_constructor: bool,
    pub is_public: bool,
    pub is_static: bool,
    /// False for interface and abstract declarations.
    pub has_body: bool,
    pub locals: Vec<LocalVariable>,
    pub call_sites: Vec<CallSite>,
    pub built_strings: Vec<BuiltString>,
    pub range: Range,
}

impl MethodInfo {
    /// Parameter-type signature used in method identities: `(EmpVO,String)`.
    pub fn signature(&self) -> String {
        let types: Vec<String> = self
            .parameters
            .iter()
            .map(|p| simple_type_name(&p.type_name))
            .collect();
        format!("({})", types.join(","))
    }

    /// Declared type of a parameter or local, innermost first.
    pub fn variable_type(&self, name: &str) -> Option<&str> {
        self.locals
            .iter()
            .rev()
            .find(|l| l.name == name)
            .map(|l| l.type_name.as_str())
            .or_else(|| {
                self.parameters
                    .iter()
                    .find(|p| p.name == name)
                    .map(|p| p.type_name.as_str())
            })
    }
}

/// A method invocation inside a method body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub callee_name: String,
    /// Receiver expression text (`empService`, `this`, `request.getSession()`).
    pub receiver: Option<String>,
    /// Argument expressions, verbatim.
    pub arguments: SmallVec<[String; 4]>,
    /// Statically evaluated string value per argument, when known.
    pub static_arguments: SmallVec<[Option<String>; 4]>,
    /// Variable the result is assigned to.
    pub assigned_to: Option<String>,
    /// Result is returned from the enclosing method, directly or through
    /// the variable it was assigned to.
    pub is_returned: bool,
    /// `(line, column)` of the call that takes this result as an argument.
    pub argument_of: Option<(u32, u32)>,
    pub line: u32,
    pub column: u32,
}

impl CallSite {
    pub fn argument_count(&self) -> usize {
        self.arguments.len()
    }

    /// `receiver.method` text used for boundary API matching.
    pub fn qualified_text(&self) -> String {
        match &self.receiver {
            Some(r) => format!("{}.{}", r, self.callee_name),
            None => self.callee_name.clone(),
        }
    }
}

/// SQL statement kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
}

impl QueryType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

    /// Parse a statement keyword or mapper tag, case-insensitively.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "select" => Some(Self::Select),
            "insert" => Some(Self::Insert),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Select)
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A parsed MyBatis mapper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapperInfo {
    pub namespace: String,
    pub statements: Vec<StatementInfo>,
}

/// One `<select|insert|update|delete>` statement with dynamic SQL flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementInfo {
    pub id: String,
    pub declared_type: QueryType,
    pub text: String,
    /// Placeholder property names in order of appearance, duplicates kept.
    pub placeholders: Vec<String>,
    pub parameter_type: Option<String>,
    pub result_type: Option<String>,
    pub line: u32,
}

/// Line span of a declaration (1-based, inclusive).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start_line: u32,
    pub end_line: u32,
}

impl Range {
    pub fn from_ts_node(node: &tree_sitter::Node) -> Self {
        Self {
            start_line: node.start_position().row as u32 + 1,
            end_line: node.end_position().row as u32 + 1,
        }
    }

    pub fn contains(&self, line: u32) -> bool {
        line >= self.start_line && line <= self.end_line
    }
}

/// Simple type name: drops package qualifier, type arguments and array brackets.
///
/// `java.util.List<EmpVO>` → `List`, `EmpVO[]` → `EmpVO`.
pub fn simple_type_name(raw: &str) -> String {
    let base = raw.split('<').next().unwrap_or(raw);
    let base = base.trim().trim_end_matches("[]").trim_end_matches("...");
    base.rsplit('.').next().unwrap_or(base).trim().to_string()
}

/// Type arguments of a generic type: `JpaRepository<Emp, Long>` → `["Emp", "Long"]`.
pub fn type_arguments(raw: &str) -> Vec<String> {
    let Some(open) = raw.find('<') else {
        return Vec::new();
    };
    let Some(close) = raw.rfind('>') else {
        return Vec::new();
    };
    if close <= open {
        return Vec::new();
    }
    let inner = &raw[open + 1..close];
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for ch in inner.chars() {
        match ch {
            '<' => {
                depth += 1;
                current.push(ch);
            }
            '>' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                args.push(simple_type_name(&current));
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        args.push(simple_type_name(&current));
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_type_names() {
        assert_eq!(simple_type_name("java.util.List<EmpVO>"), "List");
        assert_eq!(simple_type_name("EmpVO[]"), "EmpVO");
        assert_eq!(simple_type_name(" String... "), "String");
        assert_eq!(simple_type_name("Map<String, List<EmpVO>>"), "Map");
    }

    #[test]
    fn generic_arguments() {
        assert_eq!(type_arguments("JpaRepository<Employee, Long>"), vec!["Employee", "Long"]);
        assert_eq!(type_arguments("Map<String, List<EmpVO>>"), vec!["String", "List"]);
        assert!(type_arguments("EmpService").is_empty());
    }

    #[test]
    fn query_type_keywords() {
        assert_eq!(QueryType::from_keyword("SELECT"), Some(QueryType::Select));
        assert_eq!(QueryType::from_keyword("delete"), Some(QueryType::Delete));
        assert_eq!(QueryType::from_keyword("merge"), None);
        assert!(QueryType::Update.is_write());
        assert!(!QueryType::Select.is_write());
    }
}
