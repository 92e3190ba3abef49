//! Core types for declarative resource lifecycle management

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a single resource instance
///
/// ```text
/// Planned -> Created -> Synced <-> Drifted
///                         |           |
///                         +-> Deleted <+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Declared locally, no remote identity yet
    Planned,
    /// Remote identity assigned, record not yet confirmed
    Created,
    /// Local and remote agree
    Synced,
    /// Remote state differs from the last-known local record
    Drifted,
    /// Removed remotely (terminal)
    Deleted,
}

impl LifecycleState {
    /// Whether the instance has a remote identity
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Created | Self::Synced | Self::Drifted)
    }

    /// Whether this is the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// Check if moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Planned, Created)
                | (Created, Synced)
                | (Created, Drifted)
                | (Created, Planned)
                | (Synced, Drifted)
                | (Drifted, Synced)
                | (Synced, Synced)
                | (Drifted, Drifted)
                | (Synced, Deleted)
                | (Drifted, Deleted)
                | (Created, Deleted)
                | (Synced, Planned)
                | (Drifted, Planned)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Planned => "planned",
            Self::Created => "created",
            Self::Synced => "synced",
            Self::Drifted => "drifted",
            Self::Deleted => "deleted",
        };
        write!(f, "{name}")
    }
}

/// The lifecycle operations a host can invoke on an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    Read,
    Update,
    Delete,
    Import,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Import => "import",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A user-facing message returned to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    /// Attribute path the diagnostic refers to, e.g. `addresses.control`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    /// Create a warning diagnostic
    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    /// Attach an attribute path
    pub fn at(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(attr) => write!(f, "{} ({}): {}", self.summary, attr, self.detail),
            None => write!(f, "{}: {}", self.summary, self.detail),
        }
    }
}

/// An ordered list of diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    /// Add an error diagnostic
    pub fn add_error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Diagnostic::error(summary, detail));
    }

    /// Add a warning diagnostic
    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Diagnostic::warning(summary, detail));
    }

    /// Append all diagnostics from another list
    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    /// Check if any diagnostic is an error
    pub fn has_error(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    /// Iterate over error diagnostics only
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.is_error())
    }

    /// Iterate over warning diagnostics only
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| !d.is_error())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Prefix every attribute path with `prefix`
    pub fn nested(mut self, prefix: &str) -> Self {
        for diagnostic in &mut self.0 {
            diagnostic.attribute = Some(match diagnostic.attribute.take() {
                Some(attr) => format!("{prefix}.{attr}"),
                None => prefix.to_string(),
            });
        }
        self
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self(vec![diagnostic])
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ============================================================================
// Execution
// ============================================================================

/// Summary of execution results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub read: usize,
    pub updated: usize,
    pub deleted: usize,
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ExecuteSummary {
    /// Total number of remote changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.deleted
    }

    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of operations processed
    pub fn total(&self) -> usize {
        self.created + self.read + self.updated + self.deleted + self.imported + self.skipped + self.failed
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &ExecuteSummary) {
        self.created += other.created;
        self.read += other.read;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.imported += other.imported;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }

    /// Count one finished operation
    pub fn add_result(&mut self, operation: OperationKind, succeeded: bool) {
        if !succeeded {
            self.failed += 1;
            return;
        }
        match operation {
            OperationKind::Create => self.created += 1,
            OperationKind::Read => self.read += 1,
            OperationKind::Update => self.updated += 1,
            OperationKind::Delete => self.deleted += 1,
            OperationKind::Import => self.imported += 1,
        }
    }
}

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Don't call the remote system, just report what would happen
    pub dry_run: bool,
    /// Number of instances processed concurrently
    pub jobs: usize,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert!(LifecycleState::Planned.can_transition_to(LifecycleState::Created));
        assert!(LifecycleState::Synced.can_transition_to(LifecycleState::Drifted));
        assert!(LifecycleState::Drifted.can_transition_to(LifecycleState::Synced));
        assert!(!LifecycleState::Planned.can_transition_to(LifecycleState::Synced));
        assert!(!LifecycleState::Deleted.can_transition_to(LifecycleState::Synced));
        assert!(!LifecycleState::Planned.can_transition_to(LifecycleState::Deleted));
    }

    #[test]
    fn test_diagnostics_has_error() {
        let mut diags = Diagnostics::new();
        diags.add_warning("careful", "something odd");
        assert!(!diags.has_error());
        diags.add_error("broken", "something failed");
        assert!(diags.has_error());
        assert_eq!(diags.errors().count(), 1);
        assert_eq!(diags.warnings().count(), 1);
    }

    #[test]
    fn test_diagnostics_nested() {
        let diags: Diagnostics = vec![
            Diagnostic::error("a", "b").at("validity"),
            Diagnostic::error("c", "d"),
        ]
        .into_iter()
        .collect();
        let nested = diags.nested("contract_definition.main");
        let attrs: Vec<_> = nested.iter().filter_map(|d| d.attribute.clone()).collect();
        assert_eq!(
            attrs,
            vec![
                "contract_definition.main.validity".to_string(),
                "contract_definition.main".to_string()
            ]
        );
    }

    #[test]
    fn test_summary_add_result() {
        let mut summary = ExecuteSummary::default();
        summary.add_result(OperationKind::Create, true);
        summary.add_result(OperationKind::Delete, false);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.failed, 1);
        assert!(!summary.is_success());
        assert_eq!(summary.total(), 2);
    }
}
