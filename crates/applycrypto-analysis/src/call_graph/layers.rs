//! Architectural layer of a class, from stereotype annotations and naming.

use serde::{Deserialize, Serialize};

use crate::parsers::types::{has_annotation, ClassInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Controller,
    Service,
    /// DAO, DQM, mapper or repository: code that executes queries.
    Repository,
    Other,
}

impl Layer {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Controller => "controller",
            Self::Service => "service",
            Self::Repository => "repository",
            Self::Other => "other",
        }
    }

    pub fn is_data_access(&self) -> bool {
        matches!(self, Self::Repository)
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

const CONTROLLER_SUFFIXES: &[&str] = &["Controller", "Ctl", "CTL"];
const SERVICE_SUFFIXES: &[&str] = &["Service", "ServiceImpl", "Svc", "SvcImpl", "SVC", "SVCImpl", "Biz", "BIZ", "BizImpl"];
const REPOSITORY_SUFFIXES: &[&str] = &[
    "Dao", "DAO", "DaoImpl", "DAOImpl", "DaoModel", "DQM", "Dqm", "DVO", "Mapper", "Repository",
    "RepositoryImpl",
];

/// Classify a class. Stereotype annotations win over naming.
pub fn classify_layer(class: &ClassInfo) -> Layer {
    let annotations = &class.annotations;
    if has_annotation(annotations, "Controller") || has_annotation(annotations, "RestController") {
        return Layer::Controller;
    }
    if has_annotation(annotations, "Repository") || has_annotation(annotations, "Mapper") {
        return Layer::Repository;
    }
    if has_annotation(annotations, "Service") {
        return Layer::Service;
    }
    layer_from_name(&class.name)
}

/// Layer implied by a simple class name's suffix.
pub fn layer_from_name(name: &str) -> Layer {
    let ends = |suffixes: &[&str]| suffixes.iter().any(|s| name.ends_with(s));
    if ends(REPOSITORY_SUFFIXES) {
        Layer::Repository
    } else if ends(SERVICE_SUFFIXES) {
        Layer::Service
    } else if ends(CONTROLLER_SUFFIXES) {
        Layer::Controller
    } else {
        Layer::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naming_layers() {
        assert_eq!(layer_from_name("EmpController"), Layer::Controller);
        assert_eq!(layer_from_name("EmpCTL"), Layer::Controller);
        assert_eq!(layer_from_name("EmpSVCImpl"), Layer::Service);
        assert_eq!(layer_from_name("EmpBiz"), Layer::Service);
        assert_eq!(layer_from_name("EmpDQM"), Layer::Repository);
        assert_eq!(layer_from_name("EmpDaoImpl"), Layer::Repository);
        assert_eq!(layer_from_name("EmpRepository"), Layer::Repository);
        assert_eq!(layer_from_name("EmpVO"), Layer::Other);
    }
}
