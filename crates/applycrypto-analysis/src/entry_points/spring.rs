//! Spring MVC request handlers.

use crate::parsers::types::{find_annotation, has_annotation, AnnotationInfo, ClassInfo, MethodInfo, ParseResult};

use super::types::Trigger;
use super::EntryPointClassifier;

const CONTROLLER_ANNOTATIONS: &[&str] = &["Controller", "RestController"];

/// Mapping annotation → the verb it fixes (`None` for `@RequestMapping`).
const MAPPING_ANNOTATIONS: &[(&str, Option<&str>)] = &[
    ("RequestMapping", None),
    ("GetMapping", Some("GET")),
    ("PostMapping", Some("POST")),
    ("PutMapping", Some("PUT")),
    ("DeleteMapping", Some("DELETE")),
    ("PatchMapping", Some("PATCH")),
];

/// Methods carrying a request-mapping annotation inside a controller class.
pub struct SpringMvcClassifier;

impl EntryPointClassifier for SpringMvcClassifier {
    fn name(&self) -> &'static str {
        "spring_mvc"
    }

    fn classify(&self, _result: &ParseResult, class: &ClassInfo, method: &MethodInfo) -> Option<Trigger> {
        if method.is_constructor || !method.has_body || !is_controller(class) {
            return None;
        }
        let (mapping, fixed_verb) = MAPPING_ANNOTATIONS
            .iter()
            .find_map(|(name, verb)| find_annotation(&method.annotations, name).map(|a| (a, *verb)))?;

        let verbs = match fixed_verb {
            Some(v) => vec![v.to_string()],
            None => request_methods(mapping),
        };
        let prefix = find_annotation(&class.annotations, "RequestMapping").and_then(AnnotationInfo::primary_value);
        Some(Trigger::Http {
            verbs,
            path: join_route(prefix, mapping.primary_value()),
        })
    }
}

fn is_controller(class: &ClassInfo) -> bool {
    CONTROLLER_ANNOTATIONS
        .iter()
        .any(|a| has_annotation(&class.annotations, a))
        || has_annotation(&class.annotations, "RequestMapping")
}

/// `method = {RequestMethod.GET, RequestMethod.POST}` → `["GET", "POST"]`.
fn request_methods(mapping: &AnnotationInfo) -> Vec<String> {
    let mut verbs: Vec<String> = mapping
        .argument("method")
        .unwrap_or_default()
        .iter()
        .map(|v| v.rsplit('.').next().unwrap_or(v).trim().to_ascii_uppercase())
        .filter(|v| !v.is_empty())
        .collect();
    verbs.sort();
    verbs.dedup();
    verbs
}

/// Join a class-level prefix and a method route into `/a/b`.
pub fn join_route(prefix: Option<&str>, route: Option<&str>) -> Option<String> {
    if prefix.is_none() && route.is_none() {
        return None;
    }
    let segments: Vec<&str> = [prefix, route]
        .into_iter()
        .flatten()
        .flat_map(|p| p.split('/'))
        .filter(|s| !s.is_empty())
        .collect();
    Some(format!("/{}", segments.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_joining() {
        assert_eq!(join_route(Some("/emp/"), Some("list")).as_deref(), Some("/emp/list"));
        assert_eq!(join_route(None, Some("/x")).as_deref(), Some("/x"));
        assert_eq!(join_route(Some("/api"), None).as_deref(), Some("/api"));
        assert_eq!(join_route(Some(""), Some("")).as_deref(), Some("/"));
        assert_eq!(join_route(None, None), None);
    }
}
