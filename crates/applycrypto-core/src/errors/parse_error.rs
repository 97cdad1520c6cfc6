//! Parser errors.

use std::path::PathBuf;

use super::error_code::{self, ApplyCryptoErrorCode};

/// Errors that can occur while extracting symbols from one artifact.
///
/// Always scoped to a single file; the run continues without it.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Grammar not found for language: {language}")]
    GrammarNotFound { language: String },

    #[error("Tree-sitter error parsing {path}: {message}")]
    TreeSitterError { path: PathBuf, message: String },

    #[error("Partial parse of {path}: {message}")]
    PartialParse { path: PathBuf, message: String },

    #[error("Malformed mapper XML {path} at byte {position}: {message}")]
    MalformedXml {
        path: PathBuf,
        position: usize,
        message: String,
    },

    #[error("Unsupported artifact: {path}")]
    UnsupportedArtifact { path: PathBuf },
}

impl ParseError {
    /// Path of the artifact the error belongs to, when known.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::GrammarNotFound { .. } => None,
            Self::TreeSitterError { path, .. }
            | Self::PartialParse { path, .. }
            | Self::MalformedXml { path, .. }
            | Self::UnsupportedArtifact { path } => Some(path),
        }
    }
}

impl ApplyCryptoErrorCode for ParseError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedArtifact { .. } => error_code::UNSUPPORTED_ARTIFACT,
            _ => error_code::PARSE_ERROR,
        }
    }
}
