//! The closed set of sensitive-column kinds.

use serde::{Deserialize, Serialize};

/// Kind of sensitive data a column holds.
///
/// Exactly three kinds exist. Adding a variant changes the alias-table
/// shape, the config schema, and every match in the flow analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityKind {
    /// Personal names (employee name, customer name, ...).
    Name,
    /// Date of birth.
    DateOfBirth,
    /// National identifier (resident registration number, SSN, ...).
    NationalId,
}

impl SensitivityKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::DateOfBirth => "date_of_birth",
            Self::NationalId => "national_id",
        }
    }

    /// All kinds, in classification priority order.
    ///
    /// A column matching several pattern lists takes the first kind here.
    pub fn all() -> &'static [SensitivityKind] {
        &[Self::NationalId, Self::DateOfBirth, Self::Name]
    }
}

impl std::fmt::Display for SensitivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
