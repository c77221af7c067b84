// Shared error response body for the Showroom API

use chrono::Utc;
use serde::Serialize;

/// Consistent error response structure
///
/// Every error leaving the API is rendered in this shape, giving clients a
/// machine-readable `error_code` next to a human-readable `message`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g. "TOKEN_EXPIRED", "FORBIDDEN")
    pub error_code: String,

    /// Human-readable error message
    pub message: String,

    /// RFC 3339 timestamp of when the error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
