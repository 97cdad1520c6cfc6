//! ApplyCryptoErrorCode trait for diagnostic reporting.

/// Stable error codes carried into the diagnostic summary.
/// Every error enum implements this so reporting consumers can
/// group failures without parsing messages.
pub trait ApplyCryptoErrorCode {
    /// Returns the error code string (e.g., "PARSE_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted diagnostic string: `[ERROR_CODE] message`.
    fn diagnostic_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

// Error code constants.
pub const SCAN_ERROR: &str = "SCAN_ERROR";
pub const PARSE_ERROR: &str = "PARSE_ERROR";
pub const UNSUPPORTED_ARTIFACT: &str = "UNSUPPORTED_ARTIFACT";
pub const RESOLUTION_FAILURE: &str = "RESOLUTION_FAILURE";
pub const UNRESOLVED_CALL: &str = "UNRESOLVED_CALL";
pub const UNREACHABLE: &str = "UNREACHABLE";
pub const AMBIGUOUS_RESOLUTION: &str = "AMBIGUOUS_RESOLUTION";
pub const CALL_GRAPH_ERROR: &str = "CALL_GRAPH_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const INVALID_INPUT: &str = "INVALID_INPUT";
pub const CANCELLED: &str = "CANCELLED";
pub const DEADLINE_EXCEEDED: &str = "DEADLINE_EXCEEDED";
