//! Scanner subsystem: artifact discovery, kind detection, content hashing.
//!
//! Produces the `SourceArtifact` list the rest of the pipeline consumes.
//! Callers that already hold file contents can build artifacts directly
//! and skip the walker.

pub mod hasher;
pub mod language_detect;
pub mod types;
pub mod walker;

pub use language_detect::ArtifactKind;
pub use types::{ScanStats, SourceArtifact};
pub use walker::collect_artifacts;
