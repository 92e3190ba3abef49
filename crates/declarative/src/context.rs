//! Host callbacks
//!
//! These traits let the declarative crate report progress and ask for
//! confirmation without depending on a specific terminal UI.

use crate::types::{Diagnostics, OperationKind};
use anyhow::Result;

/// Progress callback for execution operations
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback: Send {
    /// Called before a batch of operations for one resource type
    fn on_batch_start(&mut self, resource_type: &str, count: usize);

    /// Called when an operation on one instance finishes
    fn on_operation_complete(
        &mut self,
        address: &str,
        operation: OperationKind,
        diagnostics: &Diagnostics,
    );

    /// Called when a batch completes
    fn on_batch_complete(&mut self);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback: Send {
    /// Ask the user to confirm an action
    ///
    /// Returns `true` if the user confirmed.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_batch_start(&mut self, _resource_type: &str, _count: usize) {}
    fn on_operation_complete(
        &mut self,
        _address: &str,
        _operation: OperationKind,
        _diagnostics: &Diagnostics,
    ) {
    }
    fn on_batch_complete(&mut self) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

