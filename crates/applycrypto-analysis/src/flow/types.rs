//! Flow records: source/sink kinds, crypto actions and placements handed to
//! the code-generation consumer.

use std::fmt;

use applycrypto_core::types::sensitivity::SensitivityKind;
use serde::{Deserialize, Serialize};

use crate::columns::types::ColumnRole;
use crate::parsers::types::QueryType;

/// Where the data on a path originates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    HttpRequest,
    ExternalApi,
    Session,
    Db,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::HttpRequest => "HTTP_REQUEST",
            Self::ExternalApi => "EXTERNAL_API",
            Self::Session => "SESSION",
            Self::Db => "DB",
        }
    }

    pub fn all() -> &'static [SourceKind] {
        &[Self::HttpRequest, Self::ExternalApi, Self::Session, Self::Db]
    }
}

/// Where the data on a path ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SinkKind {
    Db,
    HttpResponse,
    ExternalApi,
    Session,
}

impl SinkKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Db => "DB",
            Self::HttpResponse => "HTTP_RESPONSE",
            Self::ExternalApi => "EXTERNAL_API",
            Self::Session => "SESSION",
        }
    }

    pub fn all() -> &'static [SinkKind] {
        &[Self::Db, Self::HttpResponse, Self::ExternalApi, Self::Session]
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Crypto action decided for a flow or one of its legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CryptoAction {
    Encrypt,
    Decrypt,
    EncryptThenDecrypt,
    None,
}

impl CryptoAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Encrypt => "ENCRYPT",
            Self::Decrypt => "DECRYPT",
            Self::EncryptThenDecrypt => "ENCRYPT_THEN_DECRYPT",
            Self::None => "NONE",
        }
    }

    pub fn decrypts(&self) -> bool {
        matches!(self, Self::Decrypt | Self::EncryptThenDecrypt)
    }
}

impl fmt::Display for CryptoAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A sensitive column a placement acts on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetColumn {
    pub table: Option<String>,
    pub column: String,
    pub kind: SensitivityKind,
    pub role: ColumnRole,
    pub bound_parameter: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertionPosition {
    BeforeCall,
    AfterCall,
}

/// Where to insert one crypto call and what it covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Placement {
    /// `Encrypt` or `Decrypt`.
    pub action: CryptoAction,
    pub file: String,
    pub class: String,
    /// Method identity of the insertion point.
    pub method: String,
    pub position: InsertionPosition,
    /// `receiver.method` of the wrapped call.
    pub call_target: String,
    pub call_line: u32,
    pub description: String,
    /// Data object or variable to transform, when statically known.
    pub target_variable: Option<String>,
    pub columns: Vec<TargetColumn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FlowStatus {
    Ok,
    ResolutionFailed { reason: String },
    Unreachable,
}

impl FlowStatus {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::ResolutionFailed { .. } => "resolution_failed",
            Self::Unreachable => "unreachable",
        }
    }
}

/// Review flags carried next to a flow's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowFlag {
    /// An edge on the path came from a guessed overload.
    AmbiguousResolution,
    /// The wrapped call's arguments could not be bound to parameters.
    UnresolvedBinding,
    /// A traversal cap cut enumeration for this query.
    TruncatedTraversal,
}

/// One (query, path group) with its decided action and placements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRecord {
    /// `flow-` followed by a content-derived hash.
    pub id: String,
    pub query_id: String,
    pub query_type: QueryType,
    pub tables: Vec<String>,
    pub status: FlowStatus,
    pub source: Option<SourceKind>,
    pub sink: Option<SinkKind>,
    pub action: CryptoAction,
    /// Node identities, root first; the smallest path of the group.
    pub path: Vec<String>,
    /// Paths collapsed into this record.
    pub path_count: usize,
    pub columns: Vec<TargetColumn>,
    pub placements: Vec<Placement>,
    pub flags: Vec<FlowFlag>,
}
