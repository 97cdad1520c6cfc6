//! Symbol extraction: tree-sitter for Java sources, quick-xml for mapper XML.
//!
//! Every extractor produces the same `ParseResult` model; later phases
//! never look at syntax trees.

pub mod error_tolerant;
pub mod java;
pub mod manager;
pub mod mapper_xml;
pub mod traits;
pub mod types;

pub use manager::{ParseBatch, ParserManager};
pub use types::ParseResult;
