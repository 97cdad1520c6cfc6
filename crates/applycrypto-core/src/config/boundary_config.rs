//! Boundary API patterns: session access and outbound clients.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Case-insensitive globs matched against `receiver.method` at a call site
/// (`session.getAttribute`, `request.getSession().setAttribute`, `restTemplate.postForObject`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BoundaryConfig {
    pub session_read: Option<Vec<String>>,
    pub session_write: Option<Vec<String>>,
    pub outbound_client: Option<Vec<String>>,
}

const SESSION_READ: &[&str] = &[
    "*session*.getattribute",
    "*session*.get",
    "*sessionutil*.get*",
    "*sessionmanager*.get*",
];

const SESSION_WRITE: &[&str] = &[
    "*session*.setattribute",
    "*session*.put",
    "*session*.set",
    "*sessionutil*.set*",
    "*sessionmanager*.set*",
];

const OUTBOUND_CLIENT: &[&str] = &[
    "*resttemplate*.*",
    "*webclient*.*",
    "*httpclient*.*",
    "*feignclient*.*",
    "*apiclient*.*",
];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl BoundaryConfig {
    pub fn effective_session_read(&self) -> Vec<String> {
        self.session_read.clone().unwrap_or_else(|| owned(SESSION_READ))
    }

    pub fn effective_session_write(&self) -> Vec<String> {
        self.session_write.clone().unwrap_or_else(|| owned(SESSION_WRITE))
    }

    pub fn effective_outbound_client(&self) -> Vec<String> {
        self.outbound_client
            .clone()
            .unwrap_or_else(|| owned(OUTBOUND_CLIENT))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let groups = [
            ("boundaries.session_read", self.effective_session_read()),
            ("boundaries.session_write", self.effective_session_write()),
            ("boundaries.outbound_client", self.effective_outbound_client()),
        ];
        for (field, patterns) in groups {
            for pattern in patterns {
                glob::Pattern::new(&pattern).map_err(|e| ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("bad pattern {pattern:?}: {e}"),
                })?;
            }
        }
        Ok(())
    }
}
