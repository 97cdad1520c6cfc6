//! MyBatis mapper XML extractor.
//!
//! Reads the document into a small element tree with quick-xml, then
//! flattens each statement's dynamic SQL into one static text:
//! `<if>`, `<choose>` branches and `<foreach>` bodies are all kept,
//! `<where>`, `<set>` and `<trim>` add their keywords and strip overrides,
//! `<include refid>` is expanded from `<sql id>` fragments, and
//! `<selectKey>` bodies are dropped.

use std::path::Path;
use std::sync::LazyLock;
use std::time::Instant;

use applycrypto_core::errors::ParseError;
use applycrypto_core::types::collections::FxHashMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

use super::traits::ArtifactParser;
use super::types::{MapperInfo, ParseResult, QueryType, StatementInfo};
use crate::scanner::hasher::hash_content;
use crate::scanner::language_detect::ArtifactKind;
use crate::scanner::types::SourceArtifact;

/// `#{name}`, `#{name,jdbcType=VARCHAR}`, `${name}`.
static PLACEHOLDER_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[#$]\{\s*([^,}\s]+)[^}]*\}").ok());

/// Nested `<include>` expansion limit.
const MAX_INCLUDE_DEPTH: usize = 8;

pub struct MapperXmlExtractor;

impl Default for MapperXmlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MapperXmlExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactParser for MapperXmlExtractor {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::MapperXml
    }

    fn parse(&self, artifact: &SourceArtifact) -> Result<ParseResult, ParseError> {
        parse_mapper(&artifact.content, artifact.path())
    }
}

#[derive(Debug)]
enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug)]
struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
    line: u32,
}

impl XmlElement {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Parse one mapper document.
///
/// Malformed XML yields whatever statements were read before the fault,
/// flagged `has_errors`. A document without a `<mapper>` root is rejected.
pub fn parse_mapper(content: &str, path: &Path) -> Result<ParseResult, ParseError> {
    let start = Instant::now();
    let (root, fault) = read_tree(content);

    let Some(mapper) = root.children.iter().find_map(|n| match n {
        XmlNode::Element(e) if e.name == "mapper" => Some(e),
        _ => None,
    }) else {
        if let Some((position, message)) = fault {
            return Err(ParseError::MalformedXml {
                path: path.to_path_buf(),
                position,
                message,
            });
        }
        return Err(ParseError::UnsupportedArtifact {
            path: path.to_path_buf(),
        });
    };

    let namespace = mapper.attr("namespace").unwrap_or_default().to_string();
    let fragments: FxHashMap<&str, &XmlElement> = mapper
        .children
        .iter()
        .filter_map(|n| match n {
            XmlNode::Element(e) if e.name == "sql" => e.attr("id").map(|id| (id, e)),
            _ => None,
        })
        .collect();

    let mut statements = Vec::new();
    for node in &mapper.children {
        let XmlNode::Element(element) = node else {
            continue;
        };
        let Some(declared_type) = QueryType::from_keyword(&element.name) else {
            continue;
        };
        let Some(id) = element.attr("id") else {
            continue;
        };
        let mut raw = String::new();
        flatten_children(element, &fragments, &namespace, 0, &mut raw);
        let text = normalize_whitespace(&raw);
        let placeholders = placeholders_of(&text);
        statements.push(StatementInfo {
            id: id.to_string(),
            declared_type,
            text,
            placeholders,
            parameter_type: element.attr("parameterType").map(str::to_string),
            result_type: element
                .attr("resultType")
                .or_else(|| element.attr("resultMap"))
                .map(str::to_string),
            line: element.line,
        });
    }

    let (error_count, error_detail) = match &fault {
        Some((position, message)) => (1, Some(format!("byte {position}: {message}"))),
        None => (0, None),
    };

    Ok(ParseResult {
        file: path.to_string_lossy().replace('\\', "/"),
        kind: ArtifactKind::MapperXml,
        content_hash: hash_content(content.as_bytes()),
        mapper: Some(MapperInfo {
            namespace,
            statements,
        }),
        parse_time_us: start.elapsed().as_micros() as u64,
        error_count,
        has_errors: fault.is_some(),
        error_detail,
        ..Default::default()
    })
}

/// Read the document into an element tree rooted at a synthetic document node.
///
/// On a reader error the open elements are closed where they stand and the
/// fault position and message are returned alongside the partial tree.
fn read_tree(content: &str) -> (XmlElement, Option<(usize, String)>) {
    let mut reader = Reader::from_str(content);
    let mut stack = vec![XmlElement {
        name: String::new(),
        attributes: Vec::new(),
        children: Vec::new(),
        line: 0,
    }];
    let mut lines = LineCounter::new(content);
    let mut fault = None;

    loop {
        let position = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let line = lines.line_at(position);
                stack.push(start_element(&e, line));
            }
            Ok(Event::Empty(e)) => {
                let line = lines.line_at(position);
                let element = start_element(&e, line);
                push_child(&mut stack, XmlNode::Element(element));
            }
            Ok(Event::End(_)) => {
                if stack.len() > 1 {
                    if let Some(done) = stack.pop() {
                        push_child(&mut stack, XmlNode::Element(done));
                    }
                }
            }
            Ok(Event::Text(t)) => {
                let text = match t.unescape() {
                    Ok(s) => s.into_owned(),
                    Err(_) => String::from_utf8_lossy(&t).into_owned(),
                };
                push_child(&mut stack, XmlNode::Text(text));
            }
            Ok(Event::CData(c)) => {
                let text = String::from_utf8_lossy(&c).into_owned();
                push_child(&mut stack, XmlNode::Text(text));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                fault = Some((reader.error_position() as usize, e.to_string()));
                break;
            }
        }
    }

    while stack.len() > 1 {
        if let Some(open) = stack.pop() {
            push_child(&mut stack, XmlNode::Element(open));
        }
    }
    let root = stack.pop().unwrap_or(XmlElement {
        name: String::new(),
        attributes: Vec::new(),
        children: Vec::new(),
        line: 0,
    });
    (root, fault)
}

fn start_element(e: &BytesStart, line: u32) -> XmlElement {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let attributes = e
        .attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = match attr.unescape_value() {
                Ok(v) => v.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            };
            (key, value)
        })
        .collect();
    XmlElement {
        name,
        attributes,
        children: Vec::new(),
        line,
    }
}

fn push_child(stack: &mut [XmlElement], node: XmlNode) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

/// Incremental byte-offset → 1-based line mapping; offsets arrive in order.
struct LineCounter<'a> {
    bytes: &'a [u8],
    offset: usize,
    line: u32,
}

impl<'a> LineCounter<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            bytes: content.as_bytes(),
            offset: 0,
            line: 1,
        }
    }

    fn line_at(&mut self, position: usize) -> u32 {
        let end = position.min(self.bytes.len());
        if end > self.offset {
            self.line += self.bytes[self.offset..end]
                .iter()
                .filter(|b| **b == b'\n')
                .count() as u32;
            self.offset = end;
        }
        self.line
    }
}

fn flatten_children(
    element: &XmlElement,
    fragments: &FxHashMap<&str, &XmlElement>,
    namespace: &str,
    depth: usize,
    out: &mut String,
) {
    for child in &element.children {
        match child {
            XmlNode::Text(t) => {
                out.push(' ');
                out.push_str(t);
            }
            XmlNode::Element(e) => flatten_element(e, fragments, namespace, depth, out),
        }
    }
}

fn flatten_element(
    element: &XmlElement,
    fragments: &FxHashMap<&str, &XmlElement>,
    namespace: &str,
    depth: usize,
    out: &mut String,
) {
    match element.name.as_str() {
        "selectKey" | "bind" => {}
        "include" => {
            if depth >= MAX_INCLUDE_DEPTH {
                return;
            }
            let Some(refid) = element.attr("refid") else {
                return;
            };
            let local = refid
                .strip_prefix(namespace)
                .and_then(|r| r.strip_prefix('.'))
                .unwrap_or(refid);
            if let Some(fragment) = fragments.get(local).or_else(|| fragments.get(refid)) {
                flatten_children(fragment, fragments, namespace, depth + 1, out);
            }
        }
        "where" => {
            let inner = inner_text(element, fragments, namespace, depth);
            push_trimmed(out, &inner, "WHERE", "", &["AND ", "OR "], &[]);
        }
        "set" => {
            let inner = inner_text(element, fragments, namespace, depth);
            push_trimmed(out, &inner, "SET", "", &[","], &[","]);
        }
        "trim" => {
            let inner = inner_text(element, fragments, namespace, depth);
            let prefix_overrides = split_overrides(element.attr("prefixOverrides"));
            let suffix_overrides = split_overrides(element.attr("suffixOverrides"));
            let prefix_refs: Vec<&str> = prefix_overrides.iter().map(String::as_str).collect();
            let suffix_refs: Vec<&str> = suffix_overrides.iter().map(String::as_str).collect();
            push_trimmed(
                out,
                &inner,
                element.attr("prefix").unwrap_or_default(),
                element.attr("suffix").unwrap_or_default(),
                &prefix_refs,
                &suffix_refs,
            );
        }
        "foreach" => {
            let inner = inner_text(element, fragments, namespace, depth);
            out.push(' ');
            out.push_str(element.attr("open").unwrap_or_default());
            out.push(' ');
            out.push_str(&inner);
            out.push(' ');
            out.push_str(element.attr("close").unwrap_or_default());
        }
        // if, choose, when, otherwise and unknown wrappers keep their body.
        _ => flatten_children(element, fragments, namespace, depth, out),
    }
}

fn inner_text(
    element: &XmlElement,
    fragments: &FxHashMap<&str, &XmlElement>,
    namespace: &str,
    depth: usize,
) -> String {
    let mut inner = String::new();
    flatten_children(element, fragments, namespace, depth, &mut inner);
    normalize_whitespace(&inner)
}

fn split_overrides(raw: Option<&str>) -> Vec<String> {
    raw.map(|r| {
        r.split('|')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Append `prefix inner suffix` after stripping one leading and one trailing
/// override token (case-insensitive). Empty bodies contribute nothing.
fn push_trimmed(
    out: &mut String,
    inner: &str,
    prefix: &str,
    suffix: &str,
    prefix_overrides: &[&str],
    suffix_overrides: &[&str],
) {
    let mut body = inner.trim();
    for token in prefix_overrides {
        let token = token.trim();
        if body.len() >= token.len()
            && body.is_char_boundary(token.len())
            && body[..token.len()].eq_ignore_ascii_case(token)
        {
            let rest = &body[token.len()..];
            // AND must not strip the start of ANDROID_ID.
            if token.ends_with(',') || rest.starts_with(char::is_whitespace) || rest.is_empty() {
                body = rest.trim_start();
                break;
            }
        }
    }
    for token in suffix_overrides {
        let token = token.trim();
        if body.len() >= token.len() {
            let cut = body.len() - token.len();
            if body.is_char_boundary(cut) && body[cut..].eq_ignore_ascii_case(token) {
                body = body[..cut].trim_end();
                break;
            }
        }
    }
    if body.is_empty() {
        return;
    }
    out.push(' ');
    out.push_str(prefix);
    out.push(' ');
    out.push_str(body);
    out.push(' ');
    out.push_str(suffix);
}

fn normalize_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Placeholder property names in order of appearance.
pub fn placeholders_of(text: &str) -> Vec<String> {
    let Some(re) = PLACEHOLDER_RE.as_ref() else {
        return Vec::new();
    };
    re.captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> ParseResult {
        parse_mapper(xml, Path::new("EmpMapper.xml")).unwrap()
    }

    #[test]
    fn flattens_where_and_if() {
        let r = parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE mapper PUBLIC "-//mybatis.org//DTD Mapper 3.0//EN" "http://mybatis.org/dtd/mybatis-3-mapper.dtd">
<mapper namespace="com.acme.EmpMapper">
  <select id="findEmp" parameterType="EmpVO" resultType="EmpVO">
    SELECT emp_nm, birth_dt FROM employee
    <where>
      <if test="empNm != null">AND emp_nm = #{empNm}</if>
      <if test="jumin != null">AND jumin_no = #{jumin, jdbcType=VARCHAR}</if>
    </where>
  </select>
</mapper>"#,
        );
        let mapper = r.mapper.unwrap();
        assert_eq!(mapper.namespace, "com.acme.EmpMapper");
        let stmt = &mapper.statements[0];
        assert_eq!(stmt.declared_type, QueryType::Select);
        assert_eq!(
            stmt.text,
            "SELECT emp_nm, birth_dt FROM employee WHERE emp_nm = #{empNm} AND jumin_no = #{jumin, jdbcType=VARCHAR}"
        );
        assert_eq!(stmt.placeholders, vec!["empNm", "jumin"]);
        assert_eq!(stmt.line, 4);
        assert_eq!(stmt.parameter_type.as_deref(), Some("EmpVO"));
    }

    #[test]
    fn set_strips_trailing_comma_and_include_expands() {
        let r = parse(
            r#"<mapper namespace="m">
  <sql id="cols">emp_nm, birth_dt</sql>
  <update id="upd">
    UPDATE employee
    <set>
      <if test="a">emp_nm = #{empNm},</if>
      <if test="b">birth_dt = #{birthDt},</if>
    </set>
    WHERE emp_id = #{empId}
  </update>
  <select id="sel">SELECT <include refid="m.cols"/> FROM employee</select>
</mapper>"#,
        );
        let stmts = r.mapper.unwrap().statements;
        assert_eq!(
            stmts[0].text,
            "UPDATE employee SET emp_nm = #{empNm}, birth_dt = #{birthDt} WHERE emp_id = #{empId}"
        );
        assert_eq!(stmts[1].text, "SELECT emp_nm, birth_dt FROM employee");
    }

    #[test]
    fn foreach_and_select_key() {
        let r = parse(
            r#"<mapper namespace="m">
  <insert id="ins">
    <selectKey keyProperty="id" resultType="long">SELECT seq.nextval FROM dual</selectKey>
    INSERT INTO employee (emp_nm) VALUES (#{empNm})
  </insert>
  <delete id="del">
    DELETE FROM employee WHERE emp_id IN
    <foreach collection="ids" item="id" open="(" separator="," close=")">#{id}</foreach>
  </delete>
</mapper>"#,
        );
        let stmts = r.mapper.unwrap().statements;
        assert_eq!(stmts[0].text, "INSERT INTO employee (emp_nm) VALUES (#{empNm})");
        assert_eq!(stmts[1].text, "DELETE FROM employee WHERE emp_id IN ( #{id} )");
    }

    #[test]
    fn cdata_comparisons_survive() {
        let r = parse(
            r#"<mapper namespace="m"><select id="s"><![CDATA[SELECT a FROM t WHERE b < #{b}]]></select></mapper>"#,
        );
        assert_eq!(r.mapper.unwrap().statements[0].text, "SELECT a FROM t WHERE b < #{b}");
    }

    #[test]
    fn malformed_document_keeps_completed_statements() {
        let r = parse(
            r#"<mapper namespace="m">
  <select id="ok">SELECT a FROM t</select>
  <select id="bad">SELECT b FROM t</selec>
</mapper>"#,
        );
        assert!(r.has_errors);
        let stmts = r.mapper.unwrap().statements;
        assert_eq!(stmts[0].id, "ok");
    }

    #[test]
    fn non_mapper_xml_is_unsupported() {
        let err = parse_mapper("<beans><bean id=\"x\"/></beans>", Path::new("ctx.xml")).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedArtifact { .. }));
    }
}
