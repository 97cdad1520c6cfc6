//! Scanner configuration.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_FILE_SIZE;

/// Configuration for artifact collection.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScanConfig {
    /// Maximum artifact size in bytes. Default: 2MB.
    pub max_file_size: Option<u64>,
    /// Whitelist globs; when non-empty only matching files are collected.
    pub include: Vec<String>,
    /// Extra ignore globs on top of the built-in ignores.
    pub extra_ignore: Vec<String>,
    /// Follow symbolic links. Default: false.
    pub follow_symlinks: Option<bool>,
}

impl ScanConfig {
    pub fn effective_max_file_size(&self) -> u64 {
        self.max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE)
    }
}
