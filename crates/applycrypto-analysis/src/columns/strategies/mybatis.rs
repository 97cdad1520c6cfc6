//! MyBatis mapper strategy, plain and AnyframeCCS (`*DQM.xml`) flavours.

use applycrypto_core::config::SqlWrappingType;

use super::{resolve_sql, ColumnResolver};
use crate::columns::sensitivity::SensitivityClassifier;
use crate::columns::types::{DeclarationOrigin, QueryDeclaration, ResolvedQuery};
use crate::parsers::types::ParseResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavour {
    Standard,
    Ccs,
}

pub struct MybatisResolver {
    classifier: SensitivityClassifier,
    flavour: Flavour,
}

impl MybatisResolver {
    /// Accepts every XML document with a `<mapper>` root.
    pub fn standard(classifier: SensitivityClassifier) -> Self {
        Self {
            classifier,
            flavour: Flavour::Standard,
        }
    }

    /// Accepts only `*DQM.xml` mappers.
    pub fn ccs(classifier: SensitivityClassifier) -> Self {
        Self {
            classifier,
            flavour: Flavour::Ccs,
        }
    }
}

impl ColumnResolver for MybatisResolver {
    fn wrapping_type(&self) -> SqlWrappingType {
        match self.flavour {
            Flavour::Standard => SqlWrappingType::Mybatis,
            Flavour::Ccs => SqlWrappingType::MybatisCcs,
        }
    }

    fn data_access_layer(&self) -> &'static str {
        match self.flavour {
            Flavour::Standard => "mapper",
            Flavour::Ccs => "dqm",
        }
    }

    fn accepts(&self, result: &ParseResult) -> bool {
        if result.mapper.is_none() {
            return false;
        }
        match self.flavour {
            Flavour::Standard => true,
            Flavour::Ccs => result.file.to_ascii_lowercase().ends_with("dqm.xml"),
        }
    }

    fn declarations(&self, result: &ParseResult) -> Vec<QueryDeclaration> {
        let Some(mapper) = &result.mapper else {
            return Vec::new();
        };
        mapper
            .statements
            .iter()
            .map(|stmt| QueryDeclaration {
                id: statement_key(&mapper.namespace, &stmt.id),
                declared_type: Some(stmt.declared_type),
                text: stmt.text.clone(),
                placeholders: stmt.placeholders.clone(),
                file: result.file.clone(),
                line: stmt.line,
                origin: DeclarationOrigin::MapperStatement {
                    namespace: mapper.namespace.clone(),
                    statement_id: stmt.id.clone(),
                },
                layer: self.data_access_layer().to_string(),
            })
            .collect()
    }

    fn resolve(&self, declaration: &QueryDeclaration) -> ResolvedQuery {
        resolve_sql(declaration, &self.classifier)
    }
}

/// `namespace.id`, or the bare id for a mapper without a namespace.
pub fn statement_key(namespace: &str, id: &str) -> String {
    if namespace.is_empty() {
        id.to_string()
    } else {
        format!("{namespace}.{id}")
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use applycrypto_core::config::AliasTable;
    use applycrypto_core::types::sensitivity::SensitivityKind;

    use super::*;
    use crate::columns::types::{ColumnRole, ResolutionStatus};
    use crate::parsers::mapper_xml::parse_mapper;

    const MAPPER: &str = r#"<mapper namespace="com.acme.EmpMapper">
  <select id="findByName">SELECT emp_nm, birth_dt FROM employee WHERE emp_nm = #{search}</select>
  <select id="all">SELECT * FROM employee</select>
</mapper>"#;

    fn resolver(flavour: Flavour) -> MybatisResolver {
        MybatisResolver {
            classifier: SensitivityClassifier::new(&AliasTable::builtin()),
            flavour,
        }
    }

    #[test]
    fn resolves_mapper_statements() {
        let parsed = parse_mapper(MAPPER, Path::new("EmpMapper.xml")).unwrap();
        let r = resolver(Flavour::Standard);
        assert!(r.accepts(&parsed));
        let decls = r.declarations(&parsed);
        assert_eq!(decls[0].id, "com.acme.EmpMapper.findByName");

        let q = r.resolve(&decls[0]);
        assert!(q.is_resolved());
        let filtered: Vec<_> = q.columns_with_role(ColumnRole::Filtered).collect();
        assert_eq!(filtered[0].sensitivity, Some(SensitivityKind::Name));
        assert_eq!(filtered[0].bound_parameter.as_deref(), Some("search"));
        assert_eq!(q.columns_with_role(ColumnRole::Projected).count(), 2);

        let star = r.resolve(&decls[1]);
        assert!(matches!(star.status, ResolutionStatus::Failed { .. }));
        assert!(star.columns.is_empty());
    }

    #[test]
    fn ccs_only_reads_dqm_files() {
        let r = resolver(Flavour::Ccs);
        let mapper = parse_mapper(MAPPER, Path::new("EmpMapper.xml")).unwrap();
        let dqm = parse_mapper(MAPPER, Path::new("src/emp/EmpDQM.xml")).unwrap();
        assert!(!r.accepts(&mapper));
        assert!(r.accepts(&dqm));
        assert_eq!(r.declarations(&dqm)[0].layer, "dqm");
    }
}
