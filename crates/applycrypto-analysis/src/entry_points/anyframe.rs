//! AnyframeCCS controllers (`*CTL` classes) dispatched by the framework
//! without Spring mapping annotations.

use crate::parsers::types::{ClassInfo, ClassKind, MethodInfo, ParseResult};

use super::types::Trigger;
use super::EntryPointClassifier;

const CONTROLLER_SUFFIXES: &[&str] = &["CTL", "Ctl"];

pub struct AnyframeCtlClassifier;

impl EntryPointClassifier for AnyframeCtlClassifier {
    fn name(&self) -> &'static str {
        "anyframe_ctl"
    }

    fn classify(&self, _result: &ParseResult, class: &ClassInfo, method: &MethodInfo) -> Option<Trigger> {
        if class.kind != ClassKind::Class
            || !CONTROLLER_SUFFIXES.iter().any(|s| class.name.ends_with(s))
        {
            return None;
        }
        if !method.is_public || method.is_static || method.is_constructor || !method.has_body {
            return None;
        }
        if is_accessor(method) {
            return None;
        }
        Some(Trigger::Http {
            verbs: Vec::new(),
            path: None,
        })
    }
}

fn is_accessor(method: &MethodInfo) -> bool {
    let name = method.name.as_str();
    ((name.starts_with("get") || name.starts_with("is")) && method.parameters.is_empty())
        || (name.starts_with("set") && method.parameters.len() == 1)
}
