//! Failure taxonomy for lifecycle operations
//!
//! Every failure is recovered at the operation boundary and turned into a
//! [`Diagnostic`]; none of them abort the process.

use crate::types::Diagnostic;
use std::fmt;

/// What went wrong during an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Locally detectable contract violation; no remote call was made
    Validation,
    /// The remote call could not be completed (network, serialization, timeout)
    Transport,
    /// The remote system processed the request but rejected it
    Application,
    /// The remote system does not know the identifier
    NotFound,
}

impl FailureKind {
    /// Summary line used for diagnostics of this kind
    pub fn summary(&self) -> &'static str {
        match self {
            Self::Validation => "Invalid Configuration",
            Self::Transport => "Client Error",
            Self::Application => "API Error",
            Self::NotFound => "Resource Not Found",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

/// A failed lifecycle operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct Failure {
    pub kind: FailureKind,
    pub detail: String,
    /// Attribute the failure refers to, if any
    pub attribute: Option<String>,
}

impl Failure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, detail)
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Transport, detail)
    }

    pub fn application(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Application, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::NotFound, detail)
    }

    /// Attach an attribute path
    pub fn at(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == FailureKind::NotFound
    }

    /// Convert into an error diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = Diagnostic::error(self.kind.summary(), self.detail.clone());
        match &self.attribute {
            Some(attr) => diagnostic.at(attr.clone()),
            None => diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_to_diagnostic() {
        let failure = Failure::application("policy rejected").at("policy");
        let diag = failure.to_diagnostic();
        assert!(diag.is_error());
        assert_eq!(diag.summary, "API Error");
        assert_eq!(diag.detail, "policy rejected");
        assert_eq!(diag.attribute.as_deref(), Some("policy"));
    }

    #[test]
    fn test_transport_and_application_are_distinct() {
        let transport = Failure::transport("connection refused").to_diagnostic();
        let application = Failure::application("bad request").to_diagnostic();
        assert_ne!(transport.summary, application.summary);
    }

    #[test]
    fn test_display() {
        let failure = Failure::validation("validity must be at least 1");
        assert_eq!(
            failure.to_string(),
            "Invalid Configuration: validity must be at least 1"
        );
    }
}
