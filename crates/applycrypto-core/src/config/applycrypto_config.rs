//! Top-level applycrypto configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{AliasTable, AnalysisConfig, BoundaryConfig, ScanConfig, SqlWrappingType};
use crate::constants::PROJECT_CONFIG_FILE;
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Explicit overrides (applied via `apply_overrides`)
/// 2. Environment variables (`APPLYCRYPTO_*`)
/// 3. Project config (`applycrypto.toml` in project root)
/// 4. User config (`~/.applycrypto/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ApplyCryptoConfig {
    pub scan: ScanConfig,
    pub analysis: AnalysisConfig,
    /// Alias table; the built-in table applies when absent.
    pub sensitive_columns: Option<AliasTable>,
    pub boundaries: BoundaryConfig,
}

/// Override arguments applied on top of every file and env layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub sql_wrapping_type: Option<SqlWrappingType>,
    pub max_depth: Option<usize>,
    pub deadline_ms: Option<u64>,
}

impl ApplyCryptoConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, overrides: Option<&ConfigOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                Self::merge_toml_file(&mut config, &user_config_path)?;
            }
        }

        let project_config_path = root.join(PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config)?;

        if let Some(o) = overrides {
            Self::apply_overrides(&mut config, o);
        }

        Self::validate(&config)?;
        ::tracing::debug!(
            wrapping_type = %config.analysis.effective_sql_wrapping_type(),
            max_depth = config.analysis.effective_max_depth(),
            "configuration resolved"
        );
        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &ApplyCryptoConfig) -> Result<(), ConfigError> {
        let limits = [
            ("analysis.max_depth", config.analysis.max_depth),
            ("analysis.max_fan_out", config.analysis.max_fan_out),
            ("analysis.max_paths_per_query", config.analysis.max_paths_per_query),
            ("analysis.call_tree_depth", config.analysis.call_tree_depth),
        ];
        for (field, value) in limits {
            if value == Some(0) {
                return Err(ConfigError::ValidationFailed {
                    field: field.to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        if config.scan.max_file_size == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "scan.max_file_size".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if let Some(table) = &config.sensitive_columns {
            table.validate()?;
        }
        config.boundaries.validate()?;
        Ok(())
    }

    /// The alias table in effect for this run.
    pub fn alias_table(&self) -> AliasTable {
        self.sensitive_columns
            .clone()
            .unwrap_or_else(AliasTable::builtin)
    }

    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".applycrypto").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    fn merge_toml_file(config: &mut ApplyCryptoConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: ApplyCryptoConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins wherever it sets a value.
    fn merge(base: &mut ApplyCryptoConfig, other: &ApplyCryptoConfig) {
        // Scan
        if other.scan.max_file_size.is_some() {
            base.scan.max_file_size = other.scan.max_file_size;
        }
        if !other.scan.include.is_empty() {
            base.scan.include = other.scan.include.clone();
        }
        if !other.scan.extra_ignore.is_empty() {
            base.scan.extra_ignore = other.scan.extra_ignore.clone();
        }
        if other.scan.follow_symlinks.is_some() {
            base.scan.follow_symlinks = other.scan.follow_symlinks;
        }

        // Analysis
        let a = &other.analysis;
        if a.sql_wrapping_type.is_some() {
            base.analysis.sql_wrapping_type = a.sql_wrapping_type;
        }
        if a.max_depth.is_some() {
            base.analysis.max_depth = a.max_depth;
        }
        if a.max_fan_out.is_some() {
            base.analysis.max_fan_out = a.max_fan_out;
        }
        if a.max_paths_per_query.is_some() {
            base.analysis.max_paths_per_query = a.max_paths_per_query;
        }
        if a.max_escalation.is_some() {
            base.analysis.max_escalation = a.max_escalation;
        }
        if a.call_tree_depth.is_some() {
            base.analysis.call_tree_depth = a.call_tree_depth;
        }
        if a.deadline_ms.is_some() {
            base.analysis.deadline_ms = a.deadline_ms;
        }

        // The alias table is replaced whole, never merged list by list.
        if other.sensitive_columns.is_some() {
            base.sensitive_columns = other.sensitive_columns.clone();
        }

        // Boundaries
        let b = &other.boundaries;
        if b.session_read.is_some() {
            base.boundaries.session_read = b.session_read.clone();
        }
        if b.session_write.is_some() {
            base.boundaries.session_write = b.session_write.clone();
        }
        if b.outbound_client.is_some() {
            base.boundaries.outbound_client = b.outbound_client.clone();
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(config: &mut ApplyCryptoConfig) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("APPLYCRYPTO_SQL_WRAPPING_TYPE") {
            let parsed =
                SqlWrappingType::from_name(&val).ok_or_else(|| ConfigError::InvalidValue {
                    field: "APPLYCRYPTO_SQL_WRAPPING_TYPE".to_string(),
                    message: format!("unknown wrapping type {val:?}"),
                })?;
            config.analysis.sql_wrapping_type = Some(parsed);
        }
        if let Ok(val) = std::env::var("APPLYCRYPTO_MAX_DEPTH") {
            if let Ok(v) = val.parse::<usize>() {
                config.analysis.max_depth = Some(v);
            }
        }
        if let Ok(val) = std::env::var("APPLYCRYPTO_DEADLINE_MS") {
            if let Ok(v) = val.parse::<u64>() {
                config.analysis.deadline_ms = Some(v);
            }
        }
        Ok(())
    }

    /// Apply explicit overrides (highest priority).
    pub fn apply_overrides(config: &mut ApplyCryptoConfig, overrides: &ConfigOverrides) {
        if let Some(t) = overrides.sql_wrapping_type {
            config.analysis.sql_wrapping_type = Some(t);
        }
        if let Some(v) = overrides.max_depth {
            config.analysis.max_depth = Some(v);
        }
        if let Some(v) = overrides.deadline_ms {
            config.analysis.deadline_ms = Some(v);
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
