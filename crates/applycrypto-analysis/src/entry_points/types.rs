//! Entry-point types: trigger metadata and classifier coverage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How an entry point is invoked from outside the process.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// An HTTP request handler.
    Http {
        /// Upper-case verbs; empty when the mapping accepts any verb.
        verbs: Vec<String>,
        /// Route with the class-level prefix applied, when declared.
        path: Option<String>,
    },
    /// A scheduled or batch job.
    Scheduled {
        /// `cron`, `fixedDelay` or `fixedRate` expression, when declared.
        schedule: Option<String>,
    },
}

impl Trigger {
    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Http { .. } => "http",
            Self::Scheduled { .. } => "scheduled",
        }
    }
}

/// A method invocable from outside the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    /// Method identity: `pkg.Class.method(T1,T2)`.
    pub method_id: String,
    pub class: String,
    pub method: String,
    pub file: String,
    pub line: u32,
    /// Name of the classifier that marked it.
    pub classifier: String,
    pub trigger: Trigger,
}

/// Methods scanned versus marked, for diagnosing silent false negatives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPointCoverage {
    pub methods_scanned: usize,
    pub methods_marked: usize,
    pub http: usize,
    pub scheduled: usize,
    /// Marked methods per classifier name.
    pub by_classifier: BTreeMap<String, usize>,
}

impl EntryPointCoverage {
    pub fn record(&mut self, entry: &EntryPoint) {
        self.methods_marked += 1;
        match entry.trigger {
            Trigger::Http { .. } => self.http += 1,
            Trigger::Scheduled { .. } => self.scheduled += 1,
        }
        *self.by_classifier.entry(entry.classifier.clone()).or_default() += 1;
    }

    /// Marked fraction of scanned methods.
    pub fn marked_ratio(&self) -> f64 {
        if self.methods_scanned == 0 {
            0.0
        } else {
            self.methods_marked as f64 / self.methods_scanned as f64
        }
    }
}
