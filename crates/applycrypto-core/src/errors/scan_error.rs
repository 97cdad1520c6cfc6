//! Scanner errors.

use std::path::PathBuf;

use super::error_code::{self, ApplyCryptoErrorCode};

/// Errors that can occur while collecting source artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Project root not found: {path}")]
    RootNotFound { path: PathBuf },

    #[error("IO error scanning {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ApplyCryptoErrorCode for ScanError {
    fn error_code(&self) -> &'static str {
        error_code::SCAN_ERROR
    }
}
