//! applycrypto analysis engine.
//!
//! Finds where field-level encryption and decryption calls belong in a Java
//! code base. Java sources and MyBatis mappers are parsed into symbols,
//! queries are resolved to role-split columns, methods are linked into a
//! call graph with queries as nodes, and each sensitive query's reverse
//! paths are mapped to crypto actions and placements.

pub mod call_graph;
pub mod columns;
pub mod entry_points;
pub mod flow;
pub mod parsers;
pub mod pipeline;
pub mod scanner;

pub use flow::{CryptoAction, FlowRecord, SinkKind, SourceKind};
pub use pipeline::{AnalysisEngine, AnalysisReport, DiagnosticSummary};
pub use scanner::SourceArtifact;
