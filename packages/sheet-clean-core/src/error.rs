//! Error types for the cleaning engine.
//!
//! Validators and the text filter are total and never produce these; they
//! surface only at the edges (configuration, row loading, expression
//! compilation and collaborator calls).

use serde::Serialize;
use thiserror::Error;

/// Engine-level errors.
#[derive(Error, Debug, Clone)]
pub enum CleanError {
    /// Entity type name not one of client, worker, task
    #[error("Unknown entity type '{0}' (expected client, worker or task)")]
    UnknownEntityType(String),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rows could not be decoded
    #[error("Invalid row data: {0}")]
    InvalidRows(String),

    /// I/O error while loading rows or configuration
    #[error("I/O error: {0}")]
    Io(String),
}

/// Errors raised while cleaning or compiling a candidate filter expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Nothing left after cleanup
    #[error("No filter expression generated")]
    Empty,

    /// Shorter than the configured minimum
    #[error("Invalid filter expression: '{0}' is too short")]
    TooShort(String),

    /// Longer than the configured maximum
    #[error("Invalid filter expression: length {len} exceeds limit {limit}")]
    TooLong { len: usize, limit: usize },

    /// Contains a construct that is never allowed
    #[error("Invalid filter expression: unsafe pattern '{0}'")]
    Unsafe(String),

    /// Unrecognized character
    #[error("Invalid filter expression: unexpected character '{ch}' at {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    /// String literal without closing quote
    #[error("Invalid filter expression: unterminated string starting at {0}")]
    UnterminatedString(usize),

    /// Grammar error
    #[error("Invalid filter expression: {message} at token {pos}")]
    Parse { message: String, pos: usize },

    /// Method or function outside the whitelist
    #[error("Invalid filter expression: unsupported call '{0}'")]
    UnsupportedCall(String),

    /// Nesting deeper than the configured limit
    #[error("Invalid filter expression: nesting deeper than {0}")]
    TooDeep(usize),

    /// Every sampled row failed to evaluate
    #[error("Expression evaluation failed: {0}")]
    Evaluation(String),
}

/// Failures reported by an external collaborator (header mapper, expression generator).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    /// Transport failure
    #[error("API request failed: {0}")]
    Network(String),

    /// Collaborator answered with an error payload
    #[error("API error: {0}")]
    Api(String),

    /// Collaborator answered without an expression or mapping
    #[error("No filter expression generated")]
    EmptyResponse,
}

/// Category of a user-facing filter failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterErrorKind {
    Network,
    Expression,
    Api,
    Validation,
}

/// User-facing filter failure with a suggested remediation.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{message}")]
pub struct FilterError {
    #[serde(rename = "type")]
    pub kind: FilterErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl FilterError {
    /// Rejected query text (empty, too long).
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: FilterErrorKind::Validation,
            message: message.into(),
            details: Some("Please check your input and try again.".to_string()),
        }
    }

    pub fn network() -> Self {
        Self {
            kind: FilterErrorKind::Network,
            message: "Unable to connect to the AI filtering service".to_string(),
            details: Some(
                "Check your internet connection or try using manual filtering instead.".to_string(),
            ),
        }
    }

    pub fn expression() -> Self {
        Self {
            kind: FilterErrorKind::Expression,
            message: "The filter expression could not be applied".to_string(),
            details: Some("Try using simpler language or switch to manual filtering.".to_string()),
        }
    }

    pub fn not_understood() -> Self {
        Self {
            kind: FilterErrorKind::Api,
            message: "The AI could not understand your filter request".to_string(),
            details: Some(
                "Try examples like: \"name contains Corp\", \"skills include coding\"".to_string(),
            ),
        }
    }
}

impl From<ExpressionError> for FilterError {
    fn from(err: ExpressionError) -> Self {
        match err {
            ExpressionError::Empty => FilterError::not_understood(),
            _ => FilterError::expression(),
        }
    }
}

impl From<CollaboratorError> for FilterError {
    fn from(err: CollaboratorError) -> Self {
        match err {
            CollaboratorError::Network(_) => FilterError::network(),
            CollaboratorError::Api(_) | CollaboratorError::EmptyResponse => {
                FilterError::not_understood()
            }
        }
    }
}

impl From<std::io::Error> for CleanError {
    fn from(err: std::io::Error) -> Self {
        CleanError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_errors_map_to_kinds() {
        let err: FilterError = CollaboratorError::Network("timeout".into()).into();
        assert_eq!(err.kind, FilterErrorKind::Network);

        let err: FilterError = CollaboratorError::EmptyResponse.into();
        assert_eq!(err.kind, FilterErrorKind::Api);

        let err: FilterError = ExpressionError::Unsafe("eval(".into()).into();
        assert_eq!(err.kind, FilterErrorKind::Expression);
    }

    #[test]
    fn test_filter_error_serializes_type_tag() {
        let json = serde_json::to_value(FilterError::validation("Please enter a filter query"))
            .unwrap();
        assert_eq!(json["type"], "validation");
        assert_eq!(json["message"], "Please enter a filter query");
    }
}
