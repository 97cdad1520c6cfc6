//! Analysis configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CALL_TREE_DEPTH, DEFAULT_MAX_DEPTH, DEFAULT_MAX_ESCALATION, DEFAULT_MAX_FAN_OUT,
    DEFAULT_MAX_PATHS_PER_QUERY,
};

/// How the target project packages its SQL.
///
/// Selects the column resolver and the entry-point classifiers for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlWrappingType {
    /// MyBatis mapper XML files (`*mapper.xml`).
    #[default]
    Mybatis,
    /// AnyframeCCS flavour of MyBatis (`*DQM.xml`, CTL/SVC/DQM layers).
    MybatisCcs,
    /// SQL strings built in Java and handed to JDBC.
    Jdbc,
    /// JPA entities and repositories.
    Jpa,
}

impl SqlWrappingType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mybatis => "mybatis",
            Self::MybatisCcs => "mybatis_ccs",
            Self::Jdbc => "jdbc",
            Self::Jpa => "jpa",
        }
    }

    pub fn all() -> &'static [SqlWrappingType] {
        &[Self::Mybatis, Self::MybatisCcs, Self::Jdbc, Self::Jpa]
    }

    /// Parse a discriminator name as written in config or the environment.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::all().iter().copied().find(|t| t.name() == normalized)
    }
}

impl std::fmt::Display for SqlWrappingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration for the analysis subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Discriminator selecting resolver and classifier strategies. Default: mybatis.
    pub sql_wrapping_type: Option<SqlWrappingType>,
    /// Maximum reverse-traversal depth. Default: 20.
    pub max_depth: Option<usize>,
    /// Callers expanded per node during reverse traversal. Default: 512.
    pub max_fan_out: Option<usize>,
    /// Paths enumerated per query before truncation. Default: 4096.
    pub max_paths_per_query: Option<usize>,
    /// Levels an insertion point may climb past the data-access layer. Default: 1.
    pub max_escalation: Option<usize>,
    /// Depth of rendered call trees. Default: 20.
    pub call_tree_depth: Option<usize>,
    /// Run-level deadline in milliseconds, checked between phases.
    pub deadline_ms: Option<u64>,
}

impl AnalysisConfig {
    pub fn effective_sql_wrapping_type(&self) -> SqlWrappingType {
        self.sql_wrapping_type.unwrap_or_default()
    }

    pub fn effective_max_depth(&self) -> usize {
        self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH)
    }

    pub fn effective_max_fan_out(&self) -> usize {
        self.max_fan_out.unwrap_or(DEFAULT_MAX_FAN_OUT)
    }

    pub fn effective_max_paths_per_query(&self) -> usize {
        self.max_paths_per_query
            .unwrap_or(DEFAULT_MAX_PATHS_PER_QUERY)
    }

    pub fn effective_max_escalation(&self) -> usize {
        self.max_escalation.unwrap_or(DEFAULT_MAX_ESCALATION)
    }

    pub fn effective_call_tree_depth(&self) -> usize {
        self.call_tree_depth.unwrap_or(DEFAULT_CALL_TREE_DEPTH)
    }
}
