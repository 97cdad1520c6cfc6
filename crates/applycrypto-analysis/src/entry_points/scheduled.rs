//! Scheduled and batch jobs: `@Scheduled` methods and Quartz job classes.

use crate::parsers::types::{find_annotation, ClassInfo, MethodInfo, ParseResult};

use super::types::Trigger;
use super::EntryPointClassifier;

const SCHEDULE_KEYS: &[&str] = &[
    "cron",
    "fixedDelay",
    "fixedRate",
    "fixedDelayString",
    "fixedRateString",
];

pub struct ScheduledClassifier;

impl EntryPointClassifier for ScheduledClassifier {
    fn name(&self) -> &'static str {
        "scheduled"
    }

    fn classify(&self, _result: &ParseResult, class: &ClassInfo, method: &MethodInfo) -> Option<Trigger> {
        if !method.has_body || method.is_constructor {
            return None;
        }
        if let Some(annotation) = find_annotation(&method.annotations, "Scheduled") {
            let schedule = SCHEDULE_KEYS.iter().find_map(|key| {
                annotation
                    .argument(key)
                    .and_then(|v| v.first())
                    .map(|v| format!("{key}={v}"))
            });
            return Some(Trigger::Scheduled { schedule });
        }
        if is_quartz_job(class, method) {
            return Some(Trigger::Scheduled { schedule: None });
        }
        None
    }
}

/// `execute(JobExecutionContext)` on a `Job`, or `executeInternal` on a `QuartzJobBean`.
fn is_quartz_job(class: &ClassInfo, method: &MethodInfo) -> bool {
    let takes_context = method.parameters.len() == 1
        && method.parameters[0].type_name.ends_with("JobExecutionContext");
    if !takes_context {
        return false;
    }
    class.supertypes().any(|t| match t.as_str() {
        "Job" | "StatefulJob" => method.name == "execute",
        "QuartzJobBean" => method.name == "executeInternal",
        _ => false,
    })
}
