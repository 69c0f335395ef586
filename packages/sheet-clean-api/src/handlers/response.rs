//! Response envelopes for HTTP endpoints.

use serde::Serialize;

use sheet_clean_core::error::FilterError;

/// Consistent API response wrapper for success responses
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Always true for success responses
    pub success: bool,
    /// Response data
    pub data: T,
}

/// Consistent API error response wrapper
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Error code (HTTP status code as string)
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Filter failure category, for filter endpoints
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Consistent error response wrapper
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always false for error responses
    pub success: bool,
    pub error: ApiError,
}

pub fn success_response<T: Serialize>(data: T) -> ApiResponse<T> {
    ApiResponse {
        success: true,
        data,
    }
}

pub fn error_response(code: u16, message: String, details: Option<String>) -> ErrorResponse {
    ErrorResponse {
        success: false,
        error: ApiError {
            code: code.to_string(),
            message,
            details,
            kind: None,
        },
    }
}

/// Error envelope for a typed filter failure.
pub fn filter_error_response(code: u16, err: &FilterError) -> ErrorResponse {
    let kind = serde_json::to_value(err.kind)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string));
    ErrorResponse {
        success: false,
        error: ApiError {
            code: code.to_string(),
            message: err.message.clone(),
            details: err.details.clone(),
            kind,
        },
    }
}
