//! Fatal pipeline errors.

use super::error_code::{self, ApplyCryptoErrorCode};
use super::{ConfigError, ScanError};

/// The only errors allowed to abort a run.
/// Everything else degrades to flagged, partial output.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid input: no source artifacts were provided")]
    NoSourceArtifacts,

    #[error("Invalid input: none of the {provided} artifacts is a Java source or mapper")]
    NoAnalyzableArtifacts { provided: usize },

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Run cancelled before the {phase} phase")]
    Cancelled { phase: &'static str },

    #[error("Run deadline exceeded before the {phase} phase")]
    DeadlineExceeded { phase: &'static str },
}

impl ApplyCryptoErrorCode for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NoSourceArtifacts | Self::NoAnalyzableArtifacts { .. } => {
                error_code::INVALID_INPUT
            }
            Self::Scan(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::Cancelled { .. } => error_code::CANCELLED,
            Self::DeadlineExceeded { .. } => error_code::DEADLINE_EXCEEDED,
        }
    }
}
