//! Scanner data types: SourceArtifact, ScanStats.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::hasher::hash_content;
use super::language_detect::ArtifactKind;

/// One input file with its content, as handed to the extractors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceArtifact {
    pub path: PathBuf,
    pub content: String,
    pub kind: ArtifactKind,
    pub content_hash: u64,
}

impl SourceArtifact {
    /// Build an artifact, detecting its kind from path and content.
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let path = path.into();
        let content = content.into();
        let kind = ArtifactKind::from_path_and_content(&path, &content);
        let content_hash = hash_content(content.as_bytes());
        Self {
            path,
            content,
            kind,
            content_hash,
        }
    }

    /// File name without directories.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path rendered with forward slashes for stable identifiers.
    pub fn display_path(&self) -> String {
        self.path.to_string_lossy().replace('\\', "/")
    }
}

/// Aggregate statistics for a collection pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    pub total_files: usize,
    pub java_sources: usize,
    pub mapper_files: usize,
    pub skipped_other: usize,
    pub skipped_unreadable: usize,
    pub discovery_ms: u64,
}
