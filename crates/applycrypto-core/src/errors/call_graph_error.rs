//! Call graph errors.

use super::error_code::{self, ApplyCryptoErrorCode};

/// Errors that can occur when addressing the call graph.
#[derive(Debug, thiserror::Error)]
pub enum CallGraphError {
    #[error("Unknown graph node: {id}")]
    UnknownNode { id: String },

    #[error("Node {id} is not a query")]
    NotAQuery { id: String },
}

impl ApplyCryptoErrorCode for CallGraphError {
    fn error_code(&self) -> &'static str {
        error_code::CALL_GRAPH_ERROR
    }
}
