//! # applycrypto-core
//!
//! Foundation crate for the applycrypto analysis engine.
//! Defines shared types, errors, config, tracing, and cancellation.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
pub mod traits;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::ApplyCryptoConfig;
pub use errors::error_code::ApplyCryptoErrorCode;
pub use traits::cancellation::{Cancellable, CancellationToken};
pub use types::collections::{FxHashMap, FxHashSet};
pub use types::sensitivity::SensitivityKind;
