//! Sensitive-column classification against the alias table.
//!
//! A pure function of the name and the table the classifier was built
//! from. The result is one of the three `SensitivityKind`s or nothing.

use applycrypto_core::config::AliasTable;
use applycrypto_core::types::sensitivity::SensitivityKind;
use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Compiled alias table.
pub struct SensitivityClassifier {
    /// In priority order: national id, date of birth, name.
    patterns: Vec<(SensitivityKind, Vec<Pattern>)>,
}

impl SensitivityClassifier {
    /// Compile the table. Patterns that fail to compile are skipped with a
    /// warning; config validation rejects them before a normal run.
    pub fn new(table: &AliasTable) -> Self {
        let patterns = SensitivityKind::all()
            .iter()
            .map(|kind| {
                let compiled = table
                    .patterns(*kind)
                    .iter()
                    .filter_map(|p| match Pattern::new(p) {
                        Ok(pattern) => Some(pattern),
                        Err(e) => {
                            tracing::warn!(pattern = %p, error = %e, "ignoring bad sensitivity pattern");
                            None
                        }
                    })
                    .collect();
                (*kind, compiled)
            })
            .collect();
        Self { patterns }
    }

    /// Classify a column or alias name.
    pub fn classify(&self, name: &str) -> Option<SensitivityKind> {
        let name = name.trim().trim_matches('"').trim_matches('`');
        if name.is_empty() {
            return None;
        }
        self.patterns
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| p.matches_with(name, MATCH_OPTIONS)))
            .map(|(kind, _)| *kind)
    }

    /// Classify a column by its name, falling back to its select-list alias.
    pub fn classify_column(&self, name: &str, alias: Option<&str>) -> Option<SensitivityKind> {
        self.classify(name).or_else(|| alias.and_then(|a| self.classify(a)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_classifies_three_kinds() {
        let c = SensitivityClassifier::new(&AliasTable::builtin());
        assert_eq!(c.classify("EMP_NM"), Some(SensitivityKind::Name));
        assert_eq!(c.classify("birth_dt"), Some(SensitivityKind::DateOfBirth));
        assert_eq!(c.classify("jumin_no"), Some(SensitivityKind::NationalId));
        assert_eq!(c.classify("dept_id"), None);
        assert_eq!(c.classify(""), None);
    }

    #[test]
    fn national_id_wins_over_name() {
        let mut table = AliasTable::empty();
        table.name = vec!["*_nm".to_string()];
        table.national_id = vec!["jumin*".to_string()];
        let c = SensitivityClassifier::new(&table);
        assert_eq!(c.classify("jumin_nm"), Some(SensitivityKind::NationalId));
    }

    #[test]
    fn alias_is_a_fallback() {
        let c = SensitivityClassifier::new(&AliasTable::builtin());
        assert_eq!(c.classify_column("col1", Some("emp_nm")), Some(SensitivityKind::Name));
        assert_eq!(c.classify_column("col1", None), None);
    }
}
