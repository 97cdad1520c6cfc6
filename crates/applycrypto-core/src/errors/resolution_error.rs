//! Column and policy resolution failures.

use super::error_code::{self, ApplyCryptoErrorCode};

/// A query or flow whose columns, table, or crypto action could not be
/// determined statically. Never fatal: surfaced as a flagged flow record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionFailure {
    #[error("Columns of {query_id} could not be resolved: {reason}")]
    UnresolvedColumns { query_id: String, reason: String },

    #[error("Statement {query_id} has an unrecognized shape: {keyword}")]
    UnknownStatement { query_id: String, keyword: String },

    #[error("No crypto policy for source {source_kind} and sink {sink_kind}")]
    UnlistedPolicy {
        source_kind: String,
        sink_kind: String,
    },
}

impl ApplyCryptoErrorCode for ResolutionFailure {
    fn error_code(&self) -> &'static str {
        error_code::RESOLUTION_FAILURE
    }
}
