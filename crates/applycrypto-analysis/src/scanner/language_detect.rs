//! Artifact kind detection from file name and content.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// What a source artifact contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// Procedural Java source.
    JavaSource,
    /// Declarative MyBatis mapper XML.
    MapperXml,
    /// Anything else; ignored by the extractors.
    Other,
}

impl ArtifactKind {
    /// Detect the kind from the path alone.
    ///
    /// Every `.xml` file is a mapper candidate; resolvers narrow it further
    /// by name, and the mapper extractor rejects XML without a `<mapper>` root.
    pub fn from_path(path: &Path) -> ArtifactKind {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("java") => ArtifactKind::JavaSource,
            Some("xml") => ArtifactKind::MapperXml,
            _ => ArtifactKind::Other,
        }
    }

    /// Refine an XML candidate by sniffing for a mapper root element.
    pub fn from_path_and_content(path: &Path, content: &str) -> ArtifactKind {
        match Self::from_path(path) {
            ArtifactKind::MapperXml if !looks_like_mapper(content) => ArtifactKind::Other,
            kind => kind,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::JavaSource => "java",
            Self::MapperXml => "mapper_xml",
            Self::Other => "other",
        }
    }

    pub fn is_analyzable(&self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn looks_like_mapper(content: &str) -> bool {
    content.contains("<mapper") || content.contains("mybatis-3-mapper.dtd")
}
