//! Sensitive-column alias table.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::types::sensitivity::SensitivityKind;

/// Name patterns for each of the three sensitive kinds.
///
/// Patterns are case-insensitive globs matched against a column or alias
/// name (`*_nm`, `birth_dt`, `*jumin*`). Unknown keys are rejected, so the
/// table cannot grow a fourth kind through configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AliasTable {
    #[serde(default)]
    pub name: Vec<String>,
    #[serde(default)]
    pub date_of_birth: Vec<String>,
    #[serde(default)]
    pub national_id: Vec<String>,
}

impl AliasTable {
    /// Built-in table used when no `[sensitive_columns]` section is configured.
    pub fn builtin() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        Self {
            name: owned(&[
                "name", "*_name", "emp_nm", "cust_nm", "mbr_nm", "user_nm", "kor_nm", "eng_nm",
                "*_emp_nm", "*_cust_nm", "*_mbr_nm", "*_user_nm",
            ]),
            date_of_birth: owned(&[
                "birth_dt", "birth_date", "birthday", "dob", "*_birth_dt", "*brth_dt*", "*_dob",
            ]),
            national_id: owned(&[
                "*jumin*", "*rrn*", "*resident_no*", "*resident_reg*", "ssn", "*_ssn",
                "national_id*", "*ihidnum*",
            ]),
        }
    }

    /// An empty table; no column is sensitive.
    pub fn empty() -> Self {
        Self {
            name: Vec::new(),
            date_of_birth: Vec::new(),
            national_id: Vec::new(),
        }
    }

    /// Pattern list for one kind.
    pub fn patterns(&self, kind: SensitivityKind) -> &[String] {
        match kind {
            SensitivityKind::Name => &self.name,
            SensitivityKind::DateOfBirth => &self.date_of_birth,
            SensitivityKind::NationalId => &self.national_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        SensitivityKind::all()
            .iter()
            .all(|k| self.patterns(*k).is_empty())
    }

    /// Check every pattern compiles as a glob.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "sensitive_columns".to_string(),
                message: "at least one of name, date_of_birth, national_id must list a pattern"
                    .to_string(),
            });
        }
        for kind in SensitivityKind::all() {
            for pattern in self.patterns(*kind) {
                glob::Pattern::new(pattern).map_err(|e| ConfigError::InvalidValue {
                    field: format!("sensitive_columns.{}", kind.name()),
                    message: format!("bad pattern {pattern:?}: {e}"),
                })?;
            }
        }
        Ok(())
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::builtin()
    }
}
