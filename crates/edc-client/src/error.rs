//! Error types for management API operations.
//!
//! Errors are categorized so callers can tell a request that never completed
//! apart from one the connector processed and rejected.

use crate::types::ApiError;
use std::fmt;

/// Result type alias for management API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of client errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request could not be completed (network, timeout).
    Transport,
    /// The connector processed the request and rejected it.
    Application,
    /// The connector does not know the identifier.
    NotFound,
    /// The response could not be decoded.
    Format,
    /// The client itself is misconfigured.
    Config,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Transport => "Connector unreachable",
            Self::Application => "Request rejected by the connector",
            Self::NotFound => "Object not found",
            Self::Format => "Invalid response format",
            Self::Config => "Invalid client configuration",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Transport => "Check the management address and that the connector is running",
            Self::Application => "Check the declared attributes against the connector's error message",
            Self::NotFound => "The object may have been deleted outside of edcform",
            Self::Format => "The connector version may not match this client",
            Self::Config => "Check the provider block and EDC_* environment variables",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the management API.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// HTTP request failed before a usable response arrived.
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// The request did not complete in time.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The connector answered with a list of errors.
    #[error("connector returned HTTP {status}: {}", render_api_errors(.errors))]
    Api {
        /// HTTP status code.
        status: u16,
        /// Errors reported by the connector.
        errors: Vec<ApiError>,
    },

    /// The identifier is unknown to the connector.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Object kind, e.g. "asset".
        kind: String,
        /// Requested identifier.
        id: String,
    },

    /// Invalid response from API.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// The client cannot be built from its configuration.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Http {
            message: message.into(),
            status,
        }
    }

    /// Create a not-found error.
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Create an application error carrying a single message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            errors: vec![ApiError::new(message)],
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Http { .. } | Error::Timeout(_) => ErrorCategory::Transport,
            Error::Api { .. } => ErrorCategory::Application,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::InvalidConfig(_) => ErrorCategory::Config,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Whether the connector reported the identifier as unknown.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

fn render_api_errors(errors: &[ApiError]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::http(format!("HTTP {code}"), Some(code)),
            ureq::Error::Timeout(timeout) => Self::Timeout(timeout.to_string()),
            other => Self::http(other.to_string(), None),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::Transport.is_retryable());
        assert!(!ErrorCategory::Application.is_retryable());
        assert!(!ErrorCategory::NotFound.is_retryable());
        assert!(!ErrorCategory::Format.is_retryable());
        assert!(!ErrorCategory::Config.is_retryable());
    }

    #[test]
    fn test_error_category_advice() {
        assert!(!ErrorCategory::Transport.advice().is_empty());
        assert!(!ErrorCategory::Application.advice().is_empty());
        assert!(!ErrorCategory::NotFound.advice().is_empty());
    }

    #[test]
    fn test_error_http_category() {
        let err = Error::http("connection refused", None);
        assert_eq!(err.category(), ErrorCategory::Transport);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_error_timeout_category() {
        let err = Error::Timeout("global".to_string());
        assert_eq!(err.category(), ErrorCategory::Transport);
    }

    #[test]
    fn test_error_api_display() {
        let err = Error::Api {
            status: 400,
            errors: vec![
                ApiError::new("validity must be positive"),
                ApiError {
                    message: "bad operator".to_string(),
                    kind: Some("ValidationFailure".to_string()),
                    path: Some("criteria[0].operator".to_string()),
                    invalid_value: None,
                },
            ],
        };
        assert_eq!(err.category(), ErrorCategory::Application);
        let display = err.to_string();
        assert!(display.contains("HTTP 400"));
        assert!(display.contains("validity must be positive"));
        assert!(display.contains("criteria[0].operator"));
    }

    #[test]
    fn test_error_not_found() {
        let err = Error::not_found("asset", "a-1");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "asset a-1 not found");
    }

    #[test]
    fn test_error_from_serde() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: Error = parse.unwrap_err().into();
        assert_eq!(err.category(), ErrorCategory::Format);
    }
}
