//! Execution engine - runs planned lifecycle operations with parallelism

use crate::context::ProgressCallback;
use crate::planner::{Action, ExecutionPlan};
use crate::resource::{Instance, ResourceKind};
use crate::types::{
    Diagnostic, Diagnostics, ExecuteOptions, ExecuteSummary, LifecycleState, OperationKind,
};
use anyhow::Result;
use rayon::prelude::*;

/// Outcome of executing a plan for one resource kind
#[derive(Debug, Clone, Default)]
pub struct ExecuteReport {
    pub summary: ExecuteSummary,
    /// Every diagnostic produced, keyed by resource address
    pub diagnostics: Vec<(String, Diagnostic)>,
}

impl ExecuteReport {
    pub fn has_error(&self) -> bool {
        self.diagnostics.iter().any(|(_, d)| d.is_error())
    }

    /// Merge another report into this one
    pub fn merge(&mut self, other: ExecuteReport) {
        self.summary.merge(&other.summary);
        self.diagnostics.extend(other.diagnostics);
    }
}

/// One finished step on one instance
type Step = (String, OperationKind, Diagnostics);

/// Execute the planned operations for one resource kind
///
/// Instances are mutated in place. A failing instance never affects the
/// others: its diagnostics are collected and execution carries on.
///
/// # Arguments
/// * `kind` - Remote operations for the resource kind
/// * `instances` - All instances of that kind
/// * `plan` - Operations to run; instances without an entry are left alone
/// * `opts` - Execution options (dry_run, jobs)
/// * `progress` - Progress callback
pub fn execute<K, P>(
    kind: &K,
    instances: &mut [Instance<K::Record>],
    plan: &ExecutionPlan,
    opts: &ExecuteOptions,
    progress: &mut P,
) -> Result<ExecuteReport>
where
    K: ResourceKind,
    P: ProgressCallback,
{
    let resource_type = kind.type_name();
    let mut selected: Vec<(Action, &mut Instance<K::Record>)> = instances
        .iter_mut()
        .filter_map(|instance| {
            plan.action_for(resource_type, instance.name())
                .map(|action| (action, instance))
        })
        .collect();

    let mut report = ExecuteReport::default();
    if selected.is_empty() {
        return Ok(report);
    }

    if opts.dry_run {
        for (action, instance) in &selected {
            log::info!(
                "dry run: would {} {}.{}",
                action,
                resource_type,
                instance.name()
            );
        }
        report.summary.skipped = selected.len();
        return Ok(report);
    }

    progress.on_batch_start(resource_type, selected.len());

    let steps = if opts.jobs <= 1 || selected.len() == 1 {
        // Sequential execution
        let mut steps = Vec::with_capacity(selected.len());
        for (action, instance) in &mut selected {
            for step in run_action(kind, *action, instance) {
                progress.on_operation_complete(&step.0, step.1, &step.2);
                steps.push(step);
            }
        }
        steps
    } else {
        let steps = execute_parallel(kind, &mut selected, opts.jobs)?;
        // Progress is not thread-safe, so results are reported after the fact
        for (address, operation, diagnostics) in &steps {
            progress.on_operation_complete(address, *operation, diagnostics);
        }
        steps
    };

    progress.on_batch_complete();

    for (address, operation, diagnostics) in steps {
        report
            .summary
            .add_result(operation, !diagnostics.has_error());
        report
            .diagnostics
            .extend(diagnostics.into_iter().map(|d| (address.clone(), d)));
    }

    Ok(report)
}

/// Execute instances in parallel using rayon
fn execute_parallel<K>(
    kind: &K,
    selected: &mut [(Action, &mut Instance<K::Record>)],
    jobs: usize,
) -> Result<Vec<Step>>
where
    K: ResourceKind,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {}", e))?;

    let steps = pool.install(|| {
        selected
            .par_iter_mut()
            .flat_map_iter(|(action, instance)| run_action(kind, *action, instance))
            .collect()
    });

    Ok(steps)
}

/// Run one planned action on one instance
fn run_action<K>(kind: &K, action: Action, instance: &mut Instance<K::Record>) -> Vec<Step>
where
    K: ResourceKind,
{
    let address = format!("{}.{}", kind.type_name(), instance.name());
    log::debug!("{action} {address} ({})", instance.state());

    match action {
        Action::Create => vec![(address, OperationKind::Create, instance.create(kind))],
        Action::Refresh => vec![(address, OperationKind::Read, instance.read(kind))],
        Action::Reconcile => {
            let read = instance.read(kind);
            let drifted = !read.has_error() && instance.state() == LifecycleState::Drifted;
            let mut steps = vec![(address.clone(), OperationKind::Read, read)];
            if drifted {
                steps.push((address, OperationKind::Update, instance.update(kind)));
            }
            steps
        }
        Action::Delete => vec![(address, OperationKind::Delete, instance.delete(kind))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NoProgress;
    use crate::failure::FailureKind;
    use crate::planner::collect_instances;
    use crate::resource::tests::{NoteKind, note};
    use std::collections::BTreeMap;

    /// Records every callback for assertions
    #[derive(Default)]
    struct Recorder {
        batches: Vec<(String, usize)>,
        completed: Vec<(String, OperationKind)>,
    }

    impl ProgressCallback for Recorder {
        fn on_batch_start(&mut self, resource_type: &str, count: usize) {
            self.batches.push((resource_type.to_string(), count));
        }

        fn on_operation_complete(
            &mut self,
            address: &str,
            operation: OperationKind,
            _diagnostics: &Diagnostics,
        ) {
            self.completed.push((address.to_string(), operation));
        }

        fn on_batch_complete(&mut self) {}
    }

    fn planned(names: &[&str]) -> Vec<Instance<crate::resource::tests::Note>> {
        let desired = names
            .iter()
            .map(|name| ((*name).to_string(), note(name)))
            .collect();
        collect_instances(desired, BTreeMap::new())
    }

    #[test]
    fn test_execute_empty_plan() {
        let kind = NoteKind::default();
        let mut instances = planned(&[]);
        let plan = ExecutionPlan::new();
        let report = execute(
            &kind,
            &mut instances,
            &plan,
            &ExecuteOptions::default(),
            &mut NoProgress,
        )
        .unwrap();
        assert_eq!(report.summary.total(), 0);
    }

    #[test]
    fn test_execute_creates_in_parallel() {
        let kind = NoteKind::default();
        let mut instances = planned(&["a", "b", "c", "d", "e"]);
        let plan = ExecutionPlan::for_apply("note", &instances);
        let mut recorder = Recorder::default();

        let report = execute(
            &kind,
            &mut instances,
            &plan,
            &ExecuteOptions::default(),
            &mut recorder,
        )
        .unwrap();

        assert_eq!(report.summary.created, 5);
        assert!(!report.has_error());
        assert_eq!(recorder.batches, vec![("note".to_string(), 5)]);
        assert_eq!(recorder.completed.len(), 5);
        assert!(
            instances
                .iter()
                .all(|i| i.state() == LifecycleState::Synced)
        );
        assert_eq!(kind.remote.lock().unwrap().len(), 5);
    }

    #[test]
    fn test_execute_dry_run_does_nothing() {
        let kind = NoteKind::default();
        let mut instances = planned(&["a", "b"]);
        let plan = ExecutionPlan::for_apply("note", &instances);
        let opts = ExecuteOptions {
            dry_run: true,
            ..Default::default()
        };

        let report = execute(&kind, &mut instances, &plan, &opts, &mut NoProgress).unwrap();
        assert_eq!(report.summary.skipped, 2);
        assert!(kind.remote.lock().unwrap().is_empty());
        assert!(
            instances
                .iter()
                .all(|i| i.state() == LifecycleState::Planned)
        );
    }

    #[test]
    fn test_execute_failure_is_isolated() {
        let kind = NoteKind::default();
        let mut instances = planned(&["a"]);
        let plan = ExecutionPlan::for_apply("note", &instances);
        kind.fail_with(FailureKind::Application);
        let opts = ExecuteOptions {
            jobs: 1,
            ..Default::default()
        };

        let report = execute(&kind, &mut instances, &plan, &opts, &mut NoProgress).unwrap();
        assert!(report.has_error());
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.diagnostics[0].0, "note.a");
        assert_eq!(instances[0].state(), LifecycleState::Planned);
    }

    #[test]
    fn test_execute_reconcile_updates_drift() {
        let kind = NoteKind::default();
        let mut instances = planned(&["a"]);
        let plan = ExecutionPlan::for_apply("note", &instances);
        execute(
            &kind,
            &mut instances,
            &plan,
            &ExecuteOptions::default(),
            &mut NoProgress,
        )
        .unwrap();

        kind.remote
            .lock()
            .unwrap()
            .insert("note-1".to_string(), "edited".to_string());

        let plan = ExecutionPlan::for_apply("note", &instances);
        let report = execute(
            &kind,
            &mut instances,
            &plan,
            &ExecuteOptions::default(),
            &mut NoProgress,
        )
        .unwrap();

        assert_eq!(report.summary.read, 1);
        assert_eq!(report.summary.updated, 1);
        assert_eq!(instances[0].state(), LifecycleState::Synced);
        assert_eq!(instances[0].current().unwrap().text, "a");
    }
}
