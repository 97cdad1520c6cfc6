//! ArtifactParser trait: the contract every symbol extractor implements.

use applycrypto_core::errors::ParseError;

use super::types::ParseResult;
use crate::scanner::language_detect::ArtifactKind;
use crate::scanner::types::SourceArtifact;

/// Trait that every artifact extractor must implement.
pub trait ArtifactParser: Send + Sync {
    /// The artifact kind this extractor handles.
    fn kind(&self) -> ArtifactKind;

    /// Extract symbols from one artifact.
    ///
    /// Syntax errors produce a partial result with `has_errors` set, not an
    /// `Err`; `Err` means nothing usable could be extracted.
    fn parse(&self, artifact: &SourceArtifact) -> Result<ParseResult, ParseError>;
}
