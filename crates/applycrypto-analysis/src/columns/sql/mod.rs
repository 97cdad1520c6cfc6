//! Syntactic SQL handling: tokenizer and clause-role extraction.

pub mod structure;
pub mod tokenizer;

pub use structure::{analyze, ColumnOccurrence, SqlStructure, StructureError, TableRef};
