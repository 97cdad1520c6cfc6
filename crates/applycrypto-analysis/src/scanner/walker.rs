//! File walker using the `ignore` crate.
//!
//! Honors `.gitignore` and `.applycryptoignore` plus the default ignore list.

use std::path::Path;
use std::time::Instant;

use applycrypto_core::config::ScanConfig;
use applycrypto_core::errors::ScanError;

use super::language_detect::ArtifactKind;
use super::types::{ScanStats, SourceArtifact};

/// Directories never worth scanning in a Java project.
pub const DEFAULT_IGNORES: &[&str] = &[
    ".git",
    ".svn",
    ".idea",
    ".gradle",
    ".settings",
    "target",
    "build",
    "bin",
    "out",
    "node_modules",
    "dist",
];

/// Collect every Java source and mapper XML under `root`.
///
/// Returns artifacts sorted by path. Unreadable or non-UTF-8 files are
/// logged and skipped; only a missing root is an error.
pub fn collect_artifacts(
    root: &Path,
    config: &ScanConfig,
) -> Result<(Vec<SourceArtifact>, ScanStats), ScanError> {
    if !root.is_dir() {
        return Err(ScanError::RootNotFound {
            path: root.to_path_buf(),
        });
    }
    let start = Instant::now();

    let mut builder = ignore::WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .require_git(false)
        .add_custom_ignore_filename(".applycryptoignore")
        .max_filesize(Some(config.effective_max_file_size()))
        .follow_links(config.follow_symlinks.unwrap_or(false));

    // Positive patterns whitelist, negated patterns blacklist.
    let mut overrides = ignore::overrides::OverrideBuilder::new(root);
    for pattern in &config.include {
        if let Err(e) = overrides.add(pattern) {
            tracing::warn!(pattern = %pattern, error = %e, "ignoring bad include pattern");
        }
    }
    for pattern in DEFAULT_IGNORES {
        let _ = overrides.add(&format!("!{pattern}/**"));
        let _ = overrides.add(&format!("!{pattern}"));
    }
    for pattern in &config.extra_ignore {
        if let Err(e) = overrides.add(&format!("!{pattern}")) {
            tracing::warn!(pattern = %pattern, error = %e, "ignoring bad ignore pattern");
        }
    }
    match overrides.build() {
        Ok(built) => {
            builder.overrides(built);
        }
        Err(e) => tracing::warn!(error = %e, "scan overrides rejected; walking without them"),
    }

    let mut stats = ScanStats::default();
    let mut artifacts = Vec::new();

    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!(error = %e, "walk entry skipped");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.path();
        if !ArtifactKind::from_path(path).is_analyzable() {
            stats.skipped_other += 1;
            continue;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable artifact skipped");
                stats.skipped_unreadable += 1;
                continue;
            }
        };
        let relative = path.strip_prefix(root).unwrap_or(path);
        let artifact = SourceArtifact::new(relative, content);
        match artifact.kind {
            ArtifactKind::JavaSource => stats.java_sources += 1,
            ArtifactKind::MapperXml => stats.mapper_files += 1,
            ArtifactKind::Other => {
                stats.skipped_other += 1;
                continue;
            }
        }
        artifacts.push(artifact);
    }

    artifacts.sort_by(|a, b| a.path.cmp(&b.path));
    stats.total_files = artifacts.len();
    stats.discovery_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        root = %root.display(),
        java = stats.java_sources,
        mappers = stats.mapper_files,
        skipped = stats.skipped_other + stats.skipped_unreadable,
        "artifacts collected"
    );
    Ok((artifacts, stats))
}
