//! ParserManager: routes artifacts to the matching extractor.

use std::time::Instant;

use applycrypto_core::errors::ParseError;
use rayon::prelude::*;

use super::java::JavaExtractor;
use super::mapper_xml::MapperXmlExtractor;
use super::traits::ArtifactParser;
use super::types::ParseResult;
use crate::scanner::language_detect::ArtifactKind;
use crate::scanner::types::SourceArtifact;

/// Results of parsing a batch of artifacts.
///
/// Partial results appear in both lists: the result in `results`, the
/// reason in `errors` as `ParseError::PartialParse`.
#[derive(Debug, Default)]
pub struct ParseBatch {
    pub results: Vec<ParseResult>,
    pub errors: Vec<ParseError>,
    pub parse_ms: u64,
}

/// Owns one extractor per artifact kind.
pub struct ParserManager {
    java: JavaExtractor,
    mapper: MapperXmlExtractor,
}

impl Default for ParserManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserManager {
    pub fn new() -> Self {
        Self {
            java: JavaExtractor::new(),
            mapper: MapperXmlExtractor::new(),
        }
    }

    fn parser_for(&self, kind: ArtifactKind) -> Option<&dyn ArtifactParser> {
        match kind {
            ArtifactKind::JavaSource => Some(&self.java),
            ArtifactKind::MapperXml => Some(&self.mapper),
            ArtifactKind::Other => None,
        }
    }

    /// Parse one artifact.
    pub fn parse(&self, artifact: &SourceArtifact) -> Result<ParseResult, ParseError> {
        let parser = self
            .parser_for(artifact.kind)
            .ok_or_else(|| ParseError::UnsupportedArtifact {
                path: artifact.path.clone(),
            })?;
        let mut result = parser.parse(artifact)?;
        result.file = artifact.display_path();
        Ok(result)
    }

    /// Parse every analyzable artifact in parallel.
    ///
    /// Output order follows input order so downstream phases stay
    /// deterministic regardless of scheduling.
    pub fn parse_all(&self, artifacts: &[SourceArtifact]) -> ParseBatch {
        let start = Instant::now();
        let outcomes: Vec<Result<ParseResult, ParseError>> = artifacts
            .par_iter()
            .filter(|a| a.kind.is_analyzable())
            .map(|a| self.parse(a))
            .collect();

        let mut batch = ParseBatch::default();
        for outcome in outcomes {
            match outcome {
                Ok(result) => {
                    if result.has_errors {
                        batch.errors.push(ParseError::PartialParse {
                            path: result.file.clone().into(),
                            message: result
                                .error_detail
                                .clone()
                                .unwrap_or_else(|| format!("{} syntax error(s)", result.error_count)),
                        });
                    }
                    batch.results.push(result);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "artifact skipped");
                    batch.errors.push(e);
                }
            }
        }
        batch.parse_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            parsed = batch.results.len(),
            errors = batch.errors.len(),
            parse_ms = batch.parse_ms,
            "parse phase complete"
        );
        batch
    }
}
