//! # Declarative
//!
//! A framework for declarative lifecycle management of remote records.
//!
//! This crate provides the core abstractions for declaring desired records,
//! tracking what is known about their remote counterparts, and converging the
//! two through create, read, update, delete and import operations.
//!
//! ## Core Concepts
//!
//! - **ResourceKind**: Remote operations for one kind of record
//! - **Instance**: One declared resource and its lifecycle state
//! - **Failure**: Why an operation did not complete (validation, transport,
//!   application, not found)
//! - **Diagnostics**: User-facing results of every operation
//! - **ExecutionPlan**: Which operation each instance needs
//! - **Executor**: Runs a plan with bounded parallelism
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{collect_instances, execute, ExecuteOptions, ExecutionPlan, NoProgress};
//!
//! let mut instances = collect_instances(declared, persisted);
//! let plan = ExecutionPlan::for_apply(kind.type_name(), &instances);
//! let report = execute(&kind, &mut instances, &plan, &ExecuteOptions::default(), &mut NoProgress)?;
//! for (address, diagnostic) in &report.diagnostics {
//!     eprintln!("{address}: {diagnostic}");
//! }
//! ```
//!
//! ## Host Traits
//!
//! - [`ProgressCallback`]: Receives progress updates
//! - [`ConfirmCallback`]: Handles user confirmations
//!
//! This allows the crate to be used without hard dependencies on
//! specific UI frameworks.

pub mod context;
pub mod diff;
pub mod executor;
pub mod failure;
pub mod planner;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{AutoConfirm, ConfirmCallback, NoProgress, ProgressCallback};
pub use diff::{Change, DiffSummary, ResourceDiff, compute_diffs, group_by_type};
pub use executor::{ExecuteReport, execute};
pub use failure::{Failure, FailureKind};
pub use planner::{Action, ExecutionPlan, PlannedOperation, collect_instances};
pub use resource::{Instance, ResourceKind};
pub use types::{
    Diagnostic, Diagnostics, ExecuteOptions, ExecuteSummary, LifecycleState, OperationKind,
    Severity,
};
