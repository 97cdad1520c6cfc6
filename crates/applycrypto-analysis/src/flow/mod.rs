//! Boundary & flow analysis: reverse paths from each sensitive query are
//! classified by source and sink, mapped through the crypto decision table,
//! and turned into placement recommendations.

pub mod analyzer;
pub mod placement;
pub mod policy;
pub mod table_access;
pub mod types;

pub use analyzer::FlowAnalyzer;
pub use placement::{select_insertion_point, InsertionPoint};
pub use policy::decide;
pub use table_access::{summarize_table_access, TableAccess, TableColumn};
pub use types::{
    CryptoAction, FlowFlag, FlowRecord, FlowStatus, InsertionPosition, Placement, SinkKind, SourceKind, TargetColumn,
};
