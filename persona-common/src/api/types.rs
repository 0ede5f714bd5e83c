//! Shared API request/response types

use serde::{Deserialize, Serialize};

/// Error response body used by both services
///
/// ```
/// use persona_common::api::types::ErrorBody;
///
/// let body = ErrorBody::new("BAD_REQUEST", "image_base64 is not valid base64");
/// assert_eq!(body.error.code, "BAD_REQUEST");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

/// Health check response: status, module name and version
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
}
