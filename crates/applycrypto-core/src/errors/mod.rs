//! Error handling for applycrypto.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod call_graph_error;
pub mod config_error;
pub mod error_code;
pub mod parse_error;
pub mod pipeline_error;
pub mod resolution_error;
pub mod scan_error;

pub use call_graph_error::CallGraphError;
pub use config_error::ConfigError;
pub use error_code::ApplyCryptoErrorCode;
pub use parse_error::ParseError;
pub use pipeline_error::PipelineError;
pub use resolution_error::ResolutionFailure;
pub use scan_error::ScanError;
