//! Boundary API recognition: session access and outbound clients.
//!
//! Patterns are globs over the lower-cased `receiver.method` text of a
//! call site. Session reads are checked first so `session.get` never
//! counts as an outbound call.

use applycrypto_core::config::BoundaryConfig;
use glob::Pattern;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    SessionRead,
    SessionWrite,
    OutboundClient,
}

impl BoundaryKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionRead => "session_read",
            Self::SessionWrite => "session_write",
            Self::OutboundClient => "outbound_client",
        }
    }
}

/// Compiled boundary patterns.
pub struct BoundaryMatcher {
    groups: Vec<(BoundaryKind, Vec<Pattern>)>,
}

impl BoundaryMatcher {
    pub fn new(config: &BoundaryConfig) -> Self {
        let compile = |kind: BoundaryKind, patterns: Vec<String>| {
            let compiled = patterns
                .iter()
                .filter_map(|p| match Pattern::new(&p.to_ascii_lowercase()) {
                    Ok(pattern) => Some(pattern),
                    Err(e) => {
                        tracing::warn!(pattern = %p, kind = kind.name(), error = %e, "skipping bad boundary pattern");
                        None
                    }
                })
                .collect();
            (kind, compiled)
        };
        Self {
            groups: vec![
                compile(BoundaryKind::SessionRead, config.effective_session_read()),
                compile(BoundaryKind::SessionWrite, config.effective_session_write()),
                compile(BoundaryKind::OutboundClient, config.effective_outbound_client()),
            ],
        }
    }

    /// Boundary kind of a `receiver.method` call text.
    pub fn classify(&self, call_text: &str) -> Option<BoundaryKind> {
        let lowered = call_text.to_ascii_lowercase();
        self.groups
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| p.matches(&lowered)))
            .map(|(kind, _)| *kind)
    }
}

impl Default for BoundaryMatcher {
    fn default() -> Self {
        Self::new(&BoundaryConfig::default())
    }
}
