//! Shared constants for the applycrypto analysis engine.

/// applycrypto version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum artifact size in bytes for scanning (default: 2MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2_097_152;

/// Default maximum reverse-traversal depth.
pub const DEFAULT_MAX_DEPTH: usize = 20;

/// Default number of callers expanded per node during reverse traversal.
pub const DEFAULT_MAX_FAN_OUT: usize = 512;

/// Default number of paths enumerated per query before truncation.
pub const DEFAULT_MAX_PATHS_PER_QUERY: usize = 4096;

/// Default number of levels an insertion point may escalate past the data-access layer.
pub const DEFAULT_MAX_ESCALATION: usize = 1;

/// Default depth of rendered call trees.
pub const DEFAULT_CALL_TREE_DEPTH: usize = 20;

/// Project-level config file name.
pub const PROJECT_CONFIG_FILE: &str = "applycrypto.toml";

/// Environment variable holding the tracing filter.
pub const LOG_ENV_VAR: &str = "APPLYCRYPTO_LOG";
