//! Resource kinds and lifecycle-managed instances
//!
//! A [`ResourceKind`] knows how to talk to the remote system for one kind of
//! record. An [`Instance`] is one declared resource of that kind and owns the
//! state machine: every operation either completes and applies its
//! transition, or fails and leaves the instance untouched.

use crate::failure::Failure;
use crate::types::{Diagnostic, Diagnostics, LifecycleState, OperationKind};
use std::fmt;

/// Remote operations for one kind of resource
///
/// Implementations hold whatever client handle they need; they must not keep
/// mutable state shared between instances.
pub trait ResourceKind: Send + Sync {
    /// The local record type
    type Record: Clone + PartialEq + fmt::Debug + Send + Sync;

    /// Resource type name, e.g. "asset"
    fn type_name(&self) -> &'static str;

    /// Remote identifier of a record, if it has one
    fn identity(&self, record: &Self::Record) -> Option<String>;

    /// Build a record that carries nothing but an identifier
    fn seed(&self, id: &str) -> Self::Record;

    /// Create the record remotely and return it with its remote identity
    fn create(&self, desired: &Self::Record) -> Result<Self::Record, Failure>;

    /// Fetch the current remote view of a record
    ///
    /// `prior` is the last-known record; attributes the remote system does
    /// not report back are taken from it.
    fn read(&self, prior: &Self::Record) -> Result<Self::Record, Failure>;

    /// Reconcile a drifted record with the desired declaration
    fn update(&self, prior: &Self::Record, desired: &Self::Record)
    -> Result<Self::Record, Failure>;

    /// Delete the record remotely
    fn delete(&self, current: &Self::Record) -> Result<(), Failure>;

    /// Whether [`update`](Self::update) changes the remote record
    ///
    /// Kinds without a remote update call only record the declaration.
    fn updates_remotely(&self) -> bool {
        true
    }

    /// Whether the declaration and the known record disagree
    ///
    /// Kinds with computed attributes should ignore them here.
    fn differs(&self, desired: &Self::Record, current: &Self::Record) -> bool {
        desired != current
    }
}

/// One declared resource and its lifecycle state
#[derive(Debug, Clone)]
pub struct Instance<R> {
    name: String,
    state: LifecycleState,
    desired: Option<R>,
    current: Option<R>,
}

impl<R: Clone + PartialEq + fmt::Debug> Instance<R> {
    /// A resource declared locally with no remote counterpart
    pub fn planned(name: impl Into<String>, desired: R) -> Self {
        Self {
            name: name.into(),
            state: LifecycleState::Planned,
            desired: Some(desired),
            current: None,
        }
    }

    /// A resource known from persisted state
    ///
    /// `desired` is `None` when the declaration was removed.
    pub fn existing(name: impl Into<String>, current: R, desired: Option<R>) -> Self {
        Self {
            name: name.into(),
            state: LifecycleState::Synced,
            desired,
            current: Some(current),
        }
    }

    /// An empty slot that will be filled by an import
    pub fn vacant(name: impl Into<String>, desired: Option<R>) -> Self {
        Self {
            name: name.into(),
            state: LifecycleState::Planned,
            desired,
            current: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn desired(&self) -> Option<&R> {
        self.desired.as_ref()
    }

    pub fn current(&self) -> Option<&R> {
        self.current.as_ref()
    }

    /// Consume the instance, returning the record to persist (if any)
    pub fn into_current(self) -> Option<R> {
        if self.state.is_terminal() {
            None
        } else {
            self.current
        }
    }

    fn transition(&mut self, next: LifecycleState) {
        if !self.state.can_transition_to(next) {
            log::warn!(
                "{}: unexpected lifecycle transition {} -> {}",
                self.name,
                self.state,
                next
            );
        }
        log::trace!("{}: {} -> {}", self.name, self.state, next);
        self.state = next;
    }

    /// Recompute Synced/Drifted by comparing the declaration with the record
    pub fn observe<K>(&mut self, kind: &K)
    where
        K: ResourceKind<Record = R>,
    {
        if !matches!(self.state, LifecycleState::Synced | LifecycleState::Drifted) {
            return;
        }
        let drifted = match (&self.desired, &self.current) {
            (Some(desired), Some(current)) => kind.differs(desired, current),
            _ => false,
        };
        let next = if drifted {
            LifecycleState::Drifted
        } else {
            LifecycleState::Synced
        };
        if next != self.state {
            self.transition(next);
        }
    }

    fn identity<K>(&self, kind: &K) -> Option<String>
    where
        K: ResourceKind<Record = R>,
    {
        self.current.as_ref().and_then(|record| kind.identity(record))
    }

    /// Create the declared record remotely
    pub fn create<K>(&mut self, kind: &K) -> Diagnostics
    where
        K: ResourceKind<Record = R>,
    {
        let Some(desired) = self.desired.as_ref() else {
            return misuse(OperationKind::Create, &self.name, "no local declaration");
        };
        if self.state != LifecycleState::Planned {
            return misuse(
                OperationKind::Create,
                &self.name,
                &format!("instance is already {}", self.state),
            );
        }

        match kind.create(desired) {
            Ok(record) => {
                log::info!(
                    "created {} {} ({})",
                    kind.type_name(),
                    self.name,
                    kind.identity(&record).unwrap_or_default()
                );
                self.current = Some(record);
                self.transition(LifecycleState::Created);
                self.transition(LifecycleState::Synced);
                Diagnostics::new()
            }
            Err(failure) => failure.to_diagnostic().into(),
        }
    }

    /// Refresh the record from the remote system
    pub fn read<K>(&mut self, kind: &K) -> Diagnostics
    where
        K: ResourceKind<Record = R>,
    {
        let Some(prior) = self.current.as_ref() else {
            return misuse(OperationKind::Read, &self.name, "no remote identity");
        };
        if kind.identity(prior).is_none() {
            return misuse(OperationKind::Read, &self.name, "record has no identifier");
        }

        match kind.read(prior) {
            Ok(record) => {
                self.current = Some(record);
                self.transition(LifecycleState::Synced);
                self.observe(kind);
                Diagnostics::new()
            }
            Err(failure) if failure.is_not_found() => {
                let id = self.identity(kind).unwrap_or_default();
                self.current = None;
                self.transition(LifecycleState::Planned);
                Diagnostic::warning(
                    "Resource Removed Remotely",
                    format!(
                        "{} {} with id {} no longer exists remotely and will be recreated on the next apply",
                        kind.type_name(),
                        self.name,
                        id
                    ),
                )
                .into()
            }
            Err(failure) => failure.to_diagnostic().into(),
        }
    }

    /// Reconcile with the declaration
    pub fn update<K>(&mut self, kind: &K) -> Diagnostics
    where
        K: ResourceKind<Record = R>,
    {
        let (Some(prior), Some(desired)) = (self.current.as_ref(), self.desired.as_ref()) else {
            return misuse(
                OperationKind::Update,
                &self.name,
                "update needs both a remote record and a declaration",
            );
        };

        match kind.update(prior, desired) {
            Ok(record) => {
                self.current = Some(record);
                self.transition(LifecycleState::Synced);
                if kind.updates_remotely() {
                    return Diagnostics::new();
                }
                Diagnostic::warning(
                    "Update Not Applied Remotely",
                    format!(
                        "{} {} has no update endpoint; the declared attributes were recorded but the remote record is unchanged",
                        kind.type_name(),
                        self.name
                    ),
                )
                .into()
            }
            Err(failure) => failure.to_diagnostic().into(),
        }
    }

    /// Delete the record remotely
    ///
    /// On failure nothing changes, so the call can be repeated.
    pub fn delete<K>(&mut self, kind: &K) -> Diagnostics
    where
        K: ResourceKind<Record = R>,
    {
        let Some(current) = self.current.as_ref() else {
            return misuse(OperationKind::Delete, &self.name, "no remote identity");
        };

        match kind.delete(current) {
            Ok(()) => {
                self.transition(LifecycleState::Deleted);
                self.current = None;
                Diagnostics::new()
            }
            Err(failure) if failure.is_not_found() => {
                self.transition(LifecycleState::Deleted);
                self.current = None;
                Diagnostic::warning(
                    "Resource Already Deleted",
                    format!("{} {} was already gone remotely", kind.type_name(), self.name),
                )
                .into()
            }
            Err(failure) => failure.to_diagnostic().into(),
        }
    }

    /// Adopt an existing remote record by identifier, then read it
    pub fn import<K>(&mut self, kind: &K, id: &str) -> Diagnostics
    where
        K: ResourceKind<Record = R>,
    {
        if self.state.is_remote() {
            return misuse(
                OperationKind::Import,
                &self.name,
                &format!("instance is already managed ({})", self.state),
            );
        }
        let previous_state = self.state;

        self.current = Some(kind.seed(id));
        self.transition(LifecycleState::Created);
        let diagnostics = self.read(kind);

        if self.current.is_none() {
            self.state = previous_state;
            return Diagnostic::error(
                "Cannot Import Non-Existent Remote Object",
                format!("{} with id {} does not exist remotely", kind.type_name(), id),
            )
            .into();
        }
        if diagnostics.has_error() {
            self.current = None;
            self.state = previous_state;
        }
        diagnostics
    }
}

/// Diagnostic for an operation invoked in a state that does not allow it
fn misuse(operation: OperationKind, name: &str, reason: &str) -> Diagnostics {
    Diagnostic::error(
        "Invalid Lifecycle Operation",
        format!("cannot {operation} {name}: {reason}"),
    )
    .into()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::failure::FailureKind;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub struct Note {
        pub id: Option<String>,
        pub text: String,
    }

    /// In-memory kind with failure injection
    #[derive(Default)]
    pub struct NoteKind {
        pub remote: Mutex<HashMap<String, String>>,
        pub fail_next: Mutex<Option<FailureKind>>,
        pub counter: Mutex<u32>,
        pub local_update: bool,
    }

    impl NoteKind {
        pub fn fail_with(&self, kind: FailureKind) {
            *self.fail_next.lock().unwrap() = Some(kind);
        }

        fn injected(&self) -> Result<(), Failure> {
            match self.fail_next.lock().unwrap().take() {
                Some(kind) => Err(Failure::new(kind, "injected")),
                None => Ok(()),
            }
        }
    }

    impl ResourceKind for NoteKind {
        type Record = Note;

        fn type_name(&self) -> &'static str {
            "note"
        }

        fn identity(&self, record: &Note) -> Option<String> {
            record.id.clone()
        }

        fn seed(&self, id: &str) -> Note {
            Note {
                id: Some(id.to_string()),
                text: String::new(),
            }
        }

        fn create(&self, desired: &Note) -> Result<Note, Failure> {
            self.injected()?;
            let mut counter = self.counter.lock().unwrap();
            *counter += 1;
            let id = format!("note-{counter}");
            self.remote
                .lock()
                .unwrap()
                .insert(id.clone(), desired.text.clone());
            Ok(Note {
                id: Some(id),
                text: desired.text.clone(),
            })
        }

        fn read(&self, prior: &Note) -> Result<Note, Failure> {
            self.injected()?;
            let id = prior.id.clone().unwrap_or_default();
            let remote = self.remote.lock().unwrap();
            let text = remote
                .get(&id)
                .cloned()
                .ok_or_else(|| Failure::not_found(format!("note {id}")))?;
            Ok(Note { id: Some(id), text })
        }

        fn update(&self, prior: &Note, desired: &Note) -> Result<Note, Failure> {
            Ok(Note {
                id: prior.id.clone(),
                text: desired.text.clone(),
            })
        }

        fn delete(&self, current: &Note) -> Result<(), Failure> {
            self.injected()?;
            let id = current.id.clone().unwrap_or_default();
            self.remote
                .lock()
                .unwrap()
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| Failure::not_found(format!("note {id}")))
        }

        fn updates_remotely(&self) -> bool {
            !self.local_update
        }

        fn differs(&self, desired: &Note, current: &Note) -> bool {
            desired.text != current.text
        }
    }

    pub fn note(text: &str) -> Note {
        Note {
            id: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_create_assigns_identity() {
        let kind = NoteKind::default();
        let mut instance = Instance::planned("a", note("hello"));
        let diags = instance.create(&kind);
        assert!(diags.is_empty());
        assert_eq!(instance.state(), LifecycleState::Synced);
        assert_eq!(instance.current().unwrap().id.as_deref(), Some("note-1"));
    }

    #[test]
    fn test_create_failure_stays_planned() {
        let kind = NoteKind::default();
        kind.fail_with(FailureKind::Transport);
        let mut instance = Instance::planned("a", note("hello"));
        let diags = instance.create(&kind);
        assert!(diags.has_error());
        assert_eq!(diags.iter().next().unwrap().summary, "Client Error");
        assert_eq!(instance.state(), LifecycleState::Planned);
        assert!(instance.current().is_none());

        kind.fail_with(FailureKind::Application);
        let diags = instance.create(&kind);
        assert_eq!(diags.iter().next().unwrap().summary, "API Error");
        assert_eq!(instance.state(), LifecycleState::Planned);
    }

    #[test]
    fn test_create_twice_is_rejected() {
        let kind = NoteKind::default();
        let mut instance = Instance::planned("a", note("hello"));
        instance.create(&kind);
        let diags = instance.create(&kind);
        assert!(diags.has_error());
        assert_eq!(kind.remote.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_read_detects_drift() {
        let kind = NoteKind::default();
        let mut instance = Instance::planned("a", note("hello"));
        instance.create(&kind);

        kind.remote
            .lock()
            .unwrap()
            .insert("note-1".to_string(), "changed remotely".to_string());
        let diags = instance.read(&kind);
        assert!(diags.is_empty());
        assert_eq!(instance.state(), LifecycleState::Drifted);
        assert_eq!(instance.current().unwrap().text, "changed remotely");

        let diags = instance.update(&kind);
        assert!(diags.is_empty());
        assert_eq!(instance.state(), LifecycleState::Synced);
        assert_eq!(instance.current().unwrap().text, "hello");
    }

    #[test]
    fn test_local_update_is_a_warning() {
        let kind = NoteKind {
            local_update: true,
            ..Default::default()
        };
        let mut instance = Instance::planned("a", note("hello"));
        instance.create(&kind);
        kind.remote
            .lock()
            .unwrap()
            .insert("note-1".to_string(), "changed remotely".to_string());
        instance.read(&kind);

        let diags = instance.update(&kind);
        assert!(!diags.has_error());
        assert_eq!(diags.warnings().count(), 1);
        assert_eq!(
            diags.iter().next().unwrap().summary,
            "Update Not Applied Remotely"
        );
        assert_eq!(instance.state(), LifecycleState::Synced);
        assert_eq!(instance.current().unwrap().text, "hello");
    }

    #[test]
    fn test_read_not_found_returns_to_planned() {
        let kind = NoteKind::default();
        let mut instance = Instance::existing(
            "gone",
            Note {
                id: Some("note-99".into()),
                text: "x".into(),
            },
            Some(note("x")),
        );
        let diags = instance.read(&kind);
        assert!(!diags.has_error());
        assert_eq!(diags.warnings().count(), 1);
        assert_eq!(instance.state(), LifecycleState::Planned);
        assert!(instance.current().is_none());
    }

    #[test]
    fn test_read_transport_failure_keeps_record() {
        let kind = NoteKind::default();
        let mut instance = Instance::planned("a", note("hello"));
        instance.create(&kind);
        kind.fail_with(FailureKind::Transport);
        let diags = instance.read(&kind);
        assert!(diags.has_error());
        assert_eq!(instance.state(), LifecycleState::Synced);
        assert_eq!(instance.current().unwrap().text, "hello");
    }

    #[test]
    fn test_delete_failure_is_retryable() {
        let kind = NoteKind::default();
        let mut instance = Instance::planned("a", note("hello"));
        instance.create(&kind);
        let before = (instance.state(), instance.current().cloned());

        kind.fail_with(FailureKind::Transport);
        let diags = instance.delete(&kind);
        assert!(diags.has_error());
        assert_eq!((instance.state(), instance.current().cloned()), before);

        let diags = instance.delete(&kind);
        assert!(diags.is_empty());
        assert_eq!(instance.state(), LifecycleState::Deleted);
        assert!(instance.into_current().is_none());
    }

    #[test]
    fn test_delete_missing_remote_is_warning() {
        let kind = NoteKind::default();
        let mut instance = Instance::existing(
            "a",
            Note {
                id: Some("note-5".into()),
                text: "x".into(),
            },
            None,
        );
        let diags = instance.delete(&kind);
        assert!(!diags.has_error());
        assert_eq!(instance.state(), LifecycleState::Deleted);
    }

    #[test]
    fn test_import_reads_remote_record() {
        let kind = NoteKind::default();
        kind.remote
            .lock()
            .unwrap()
            .insert("note-7".to_string(), "imported".to_string());

        let mut instance = Instance::vacant("a", Some(note("imported")));
        let diags = instance.import(&kind, "note-7");
        assert!(diags.is_empty());
        assert_eq!(instance.state(), LifecycleState::Synced);
        assert_eq!(instance.current().unwrap().text, "imported");
    }

    #[test]
    fn test_import_unknown_id_leaves_instance_vacant() {
        let kind = NoteKind::default();
        let mut instance: Instance<Note> = Instance::vacant("a", None);
        let diags = instance.import(&kind, "nope");
        assert!(diags.has_error());
        assert_eq!(instance.state(), LifecycleState::Planned);
        assert!(instance.current().is_none());
    }
}
