//! Entry-Point Classifier: marks externally invocable methods and
//! records how they are triggered.
//!
//! Classifiers are conservative. A method no enabled classifier recognizes
//! is not an entry point, so `classify_all` reports coverage counts next to
//! the marked set.

pub mod anyframe;
pub mod scheduled;
pub mod spring;
pub mod types;

use applycrypto_core::config::SqlWrappingType;

use crate::call_graph::types::method_id;
use crate::parsers::types::{ClassInfo, MethodInfo, ParseResult};
use crate::scanner::language_detect::ArtifactKind;

pub use types::{EntryPoint, EntryPointCoverage, Trigger};

/// Trait every entry-point classification strategy implements.
pub trait EntryPointClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Trigger metadata when the method is an entry point under this strategy.
    fn classify(&self, result: &ParseResult, class: &ClassInfo, method: &MethodInfo) -> Option<Trigger>;
}

/// Classifiers enabled for a wrapping type, in precedence order.
pub fn create_classifiers(wrapping: SqlWrappingType) -> Vec<Box<dyn EntryPointClassifier>> {
    let mut classifiers: Vec<Box<dyn EntryPointClassifier>> = vec![
        Box::new(spring::SpringMvcClassifier),
        Box::new(scheduled::ScheduledClassifier),
    ];
    if wrapping == SqlWrappingType::MybatisCcs {
        classifiers.push(Box::new(anyframe::AnyframeCtlClassifier));
    }
    classifiers
}

/// Run the classifiers over every Java method. The first classifier that
/// recognizes a method wins.
///
/// Entry points come back sorted by method identity.
pub fn classify_all(
    classifiers: &[Box<dyn EntryPointClassifier>],
    results: &[ParseResult],
) -> (Vec<EntryPoint>, EntryPointCoverage) {
    let mut coverage = EntryPointCoverage::default();
    let mut entries = Vec::new();

    for result in results.iter().filter(|r| r.kind == ArtifactKind::JavaSource) {
        for (class, method) in result.methods() {
            coverage.methods_scanned += 1;
            let hit = classifiers
                .iter()
                .find_map(|c| c.classify(result, class, method).map(|t| (c.name(), t)));
            let Some((classifier, trigger)) = hit else {
                continue;
            };
            let entry = EntryPoint {
                method_id: method_id(&class.qualified_name, method),
                class: class.qualified_name.clone(),
                method: method.name.clone(),
                file: result.file.clone(),
                line: method.range.start_line,
                classifier: classifier.to_string(),
                trigger,
            };
            tracing::debug!(method = %entry.method_id, classifier, "entry point");
            coverage.record(&entry);
            entries.push(entry);
        }
    }

    entries.sort_by(|a, b| a.method_id.cmp(&b.method_id));
    entries.dedup_by(|a, b| a.method_id == b.method_id);
    tracing::info!(
        scanned = coverage.methods_scanned,
        marked = coverage.methods_marked,
        http = coverage.http,
        scheduled = coverage.scheduled,
        "entry point classification complete"
    );
    if coverage.methods_scanned > 0 && coverage.methods_marked == 0 {
        tracing::warn!("no entry points recognized; every flow will be reported unreachable");
    }
    (entries, coverage)
}
