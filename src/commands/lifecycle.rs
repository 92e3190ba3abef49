//! Lifecycle commands
//!
//! Every resource kind runs through the same pipeline: declarations and
//! recorded state are paired into instances, a plan picks an action per
//! instance and the executor runs it. Creates, reads and reconciles follow
//! dependency order (assets, policies, contract definitions); deletes run in
//! reverse so contract definitions go before the policies they reference.

use anyhow::Result;
use colored::Colorize;
use declarative::{
    Action, AutoConfirm, ConfirmCallback, Diagnostic, Diagnostics, ExecuteOptions, ExecuteReport,
    ExecutionPlan, Instance, ResourceDiff, ResourceKind, collect_instances, compute_diffs, execute,
};
use edc_client::Client;

use super::{Tracked, Workspace};
use crate::Context;
use crate::cli::{ApplyArgs, DestroyArgs, TargetArgs};
use crate::manifest::Manifest;
use crate::resources::{AssetResource, ContractDefinitionResource, Kind, PolicyResource};
use crate::state::State;
use crate::ui::{self, ConsoleProgress, PromptConfirm};

/// What a lifecycle run does with known instances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Apply,
    Refresh,
    Destroy,
}

// ============================================================================
// Stages
// ============================================================================

/// One resource kind's instances, type-erased so kinds run in sequence
trait Stage {
    fn plan(&self, mode: Mode) -> ExecutionPlan;

    fn diffs(&self) -> Vec<ResourceDiff>;

    fn execute(
        &mut self,
        plan: &ExecutionPlan,
        opts: &ExecuteOptions,
        progress: &mut ConsoleProgress,
    ) -> Result<ExecuteReport>;

    /// Write surviving records back into state
    fn store(self: Box<Self>, state: &mut State);
}

struct Batch<K: ResourceKind> {
    kind: K,
    instances: Vec<Instance<K::Record>>,
}

impl<K> Batch<K>
where
    K: ResourceKind,
    K::Record: Tracked,
{
    /// Takes the kind's records out of `state`; `store` puts them back
    fn new(kind: K, manifest: &Manifest, state: &mut State) -> Self {
        let desired = <K::Record as Tracked>::declared_in(manifest).clone();
        let recorded = std::mem::take(<K::Record as Tracked>::recorded_in(state));
        Self {
            kind,
            instances: collect_instances(desired, recorded),
        }
    }
}

impl<K> Stage for Batch<K>
where
    K: ResourceKind,
    K::Record: Tracked,
{
    fn plan(&self, mode: Mode) -> ExecutionPlan {
        let type_name = self.kind.type_name();
        match mode {
            Mode::Apply => ExecutionPlan::for_apply(type_name, &self.instances),
            Mode::Refresh => ExecutionPlan::for_refresh(type_name, &self.instances),
            Mode::Destroy => ExecutionPlan::for_destroy(type_name, &self.instances),
        }
    }

    fn diffs(&self) -> Vec<ResourceDiff> {
        compute_diffs(&self.kind, &self.instances, <K::Record as Tracked>::render)
    }

    fn execute(
        &mut self,
        plan: &ExecutionPlan,
        opts: &ExecuteOptions,
        progress: &mut ConsoleProgress,
    ) -> Result<ExecuteReport> {
        execute(&self.kind, &mut self.instances, plan, opts, progress)
    }

    fn store(self: Box<Self>, state: &mut State) {
        let section = <K::Record as Tracked>::recorded_in(state);
        for instance in self.instances {
            let name = instance.name().to_string();
            if let Some(record) = instance.into_current() {
                section.insert(name, record);
            }
        }
    }
}

fn stages<'a>(
    client: &'a Client,
    manifest: &Manifest,
    state: &mut State,
) -> Vec<Box<dyn Stage + 'a>> {
    let assets: Box<dyn Stage + 'a> =
        Box::new(Batch::new(AssetResource::new(client), manifest, state));
    let policies: Box<dyn Stage + 'a> =
        Box::new(Batch::new(PolicyResource::new(client), manifest, state));
    let contract_definitions: Box<dyn Stage + 'a> = Box::new(Batch::new(
        ContractDefinitionResource::new(client),
        manifest,
        state,
    ));
    vec![assets, policies, contract_definitions]
}

/// Split a plan into (deletes, everything else)
fn split_deletes(plan: &ExecutionPlan) -> (ExecutionPlan, ExecutionPlan) {
    let (deletes, others): (Vec<_>, Vec<_>) = plan
        .operations
        .iter()
        .cloned()
        .partition(|op| op.action == Action::Delete);
    (
        ExecutionPlan {
            operations: deletes,
        },
        ExecutionPlan { operations: others },
    )
}

fn check_target(target: Option<&str>) -> Result<()> {
    let Some(target) = target else {
        return Ok(());
    };
    let (type_part, name) = match target.split_once('.') {
        Some((type_part, name)) => (type_part, Some(name)),
        None => (target, None),
    };
    if Kind::from_type_name(type_part).is_none() || name.is_some_and(str::is_empty) {
        anyhow::bail!(
            "Invalid target '{target}': expected asset, policy or contract_definition, \
             optionally followed by .<name>"
        );
    }
    Ok(())
}

// ============================================================================
// Core
// ============================================================================

/// Planned operations and the diffs behind them, without touching state
pub(crate) fn preview(
    client: &Client,
    manifest: &Manifest,
    state: &State,
    mode: Mode,
    target: Option<&str>,
) -> (ExecutionPlan, Vec<ResourceDiff>) {
    let mut scratch = state.clone();
    let mut plan = ExecutionPlan::new();
    let mut diffs = Vec::new();
    for stage in stages(client, manifest, &mut scratch) {
        let stage_plan = stage.plan(mode).filter_by_target(target);
        diffs.extend(stage.diffs().into_iter().filter(|diff| {
            stage_plan
                .operations
                .iter()
                .any(|op| op.address() == diff.address)
        }));
        plan.merge(stage_plan);
    }
    (plan, diffs)
}

/// Run a lifecycle mode over every kind and update `state` in place
///
/// Records are written back even when execution stops early, so state
/// always reflects the remote changes that did happen.
pub(crate) fn converge(
    client: &Client,
    manifest: &Manifest,
    state: &mut State,
    mode: Mode,
    target: Option<&str>,
    opts: &ExecuteOptions,
    progress: &mut ConsoleProgress,
) -> Result<ExecuteReport> {
    let mut stages = stages(client, manifest, state);
    let plans: Vec<ExecutionPlan> = stages
        .iter()
        .map(|stage| stage.plan(mode).filter_by_target(target))
        .collect();

    let mut report = ExecuteReport::default();
    let outcome = run_phases(&mut stages, &plans, opts, progress, &mut report);

    for stage in stages {
        stage.store(state);
    }
    outcome.map(|()| report)
}

fn run_phases(
    stages: &mut [Box<dyn Stage + '_>],
    plans: &[ExecutionPlan],
    opts: &ExecuteOptions,
    progress: &mut ConsoleProgress,
    report: &mut ExecuteReport,
) -> Result<()> {
    for (stage, plan) in stages.iter_mut().zip(plans) {
        let (_, others) = split_deletes(plan);
        report.merge(stage.execute(&others, opts, progress)?);
    }
    for (stage, plan) in stages.iter_mut().zip(plans).rev() {
        let (deletes, _) = split_deletes(plan);
        report.merge(stage.execute(&deletes, opts, progress)?);
    }
    Ok(())
}

/// Adopt a remote record into state under `name`
fn adopt<K>(kind: &K, name: &str, id: &str, manifest: &Manifest, state: &mut State) -> Diagnostics
where
    K: ResourceKind,
    K::Record: Tracked,
{
    let section = <K::Record as Tracked>::recorded_in(state);
    if section.contains_key(name) {
        return Diagnostic::error(
            "Resource Already Managed",
            format!(
                "{}.{name} is already in state; remove it before importing again",
                kind.type_name()
            ),
        )
        .into();
    }

    let desired = <K::Record as Tracked>::declared_in(manifest).get(name).cloned();
    let mut instance = Instance::vacant(name, desired);
    let diagnostics = instance.import(kind, id);
    if let Some(record) = instance.into_current() {
        section.insert(name.to_string(), record);
    }
    diagnostics
}

/// Split `kind.name` into its parts
pub(crate) fn parse_address(address: &str) -> Result<(Kind, &str)> {
    let parsed = address
        .split_once('.')
        .and_then(|(type_part, name)| Some((Kind::from_type_name(type_part)?, name)))
        .filter(|(_, name)| !name.is_empty());
    parsed.ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid resource address '{address}': expected <kind>.<name>, e.g. asset.raw"
        )
    })
}

fn report_diagnostics(report: &ExecuteReport) {
    for (address, diagnostic) in &report.diagnostics {
        ui::diagnostic(Some(address), diagnostic);
    }
}

fn finish(ws: &mut Workspace, report: &ExecuteReport, action: &str, dry_run: bool) -> Result<()> {
    report_diagnostics(report);
    if !dry_run {
        ws.save()?;
    }
    ui::print_summary(&report.summary, action);

    let errors = report.diagnostics.iter().filter(|(_, d)| d.is_error()).count();
    if errors > 0 {
        anyhow::bail!("{action} finished with {errors} error(s)");
    }
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

/// Show what apply would change
pub fn plan(ctx: &Context, args: &TargetArgs) -> Result<()> {
    check_target(args.target.as_deref())?;
    let ws = Workspace::load(ctx)?;
    let client = ws.client()?;

    let (plan, diffs) = preview(
        &client,
        &ws.manifest,
        &ws.state,
        Mode::Apply,
        args.target.as_deref(),
    );
    ui::display_plan(&diffs);

    let refreshes = plan.count(Action::Reconcile);
    if refreshes > 0 && !ctx.quiet {
        ui::dim(&format!(
            "{refreshes} recorded resource(s) will be re-read from the connector during apply"
        ));
    }
    Ok(())
}

/// Create, reconcile and delete resources to match the manifest
pub fn apply(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    let target = args.target.target.as_deref();
    check_target(target)?;
    let mut ws = Workspace::load(ctx)?;
    let client = ws.client()?;

    let (plan, diffs) = preview(&client, &ws.manifest, &ws.state, Mode::Apply, target);
    ui::display_plan(&diffs);
    if plan.is_empty() {
        return Ok(());
    }

    let mut confirm: Box<dyn ConfirmCallback> = if args.yes || args.dry_run || diffs.is_empty() {
        Box::new(AutoConfirm)
    } else {
        Box::new(PromptConfirm)
    };
    if !confirm.confirm("Apply these changes?")? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(());
    }

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        jobs: args.jobs.max(1),
    };
    if args.dry_run {
        ui::info("Dry run - no changes will be made");
    }

    let mut progress = ConsoleProgress::new(ctx.quiet);
    let Workspace {
        manifest, state, ..
    } = &mut ws;
    let report = converge(
        &client,
        manifest,
        state,
        Mode::Apply,
        target,
        &opts,
        &mut progress,
    )?;
    finish(&mut ws, &report, "Apply", args.dry_run)
}

/// Re-read every recorded resource
pub fn refresh(ctx: &Context, args: &TargetArgs) -> Result<()> {
    let target = args.target.as_deref();
    check_target(target)?;
    let mut ws = Workspace::load(ctx)?;
    let client = ws.client()?;

    if ws.state.is_empty() {
        ui::info("No resources recorded in state");
        return Ok(());
    }

    let mut progress = ConsoleProgress::new(ctx.quiet);
    let Workspace {
        manifest, state, ..
    } = &mut ws;
    let report = converge(
        &client,
        manifest,
        state,
        Mode::Refresh,
        target,
        &ExecuteOptions::default(),
        &mut progress,
    )?;
    finish(&mut ws, &report, "Refresh", false)
}

/// Delete every recorded resource
pub fn destroy(ctx: &Context, args: &DestroyArgs) -> Result<()> {
    let target = args.target.target.as_deref();
    check_target(target)?;
    let mut ws = Workspace::load(ctx)?;
    let client = ws.client()?;

    let (plan, _) = preview(&client, &ws.manifest, &ws.state, Mode::Destroy, target);
    if plan.is_empty() {
        ui::info("Nothing to destroy");
        return Ok(());
    }

    ui::header("Resources to delete");
    for op in &plan.operations {
        println!("  {} {}", "-".red(), op.address());
    }
    println!();

    let mut confirm: Box<dyn ConfirmCallback> = if args.yes {
        Box::new(AutoConfirm)
    } else {
        Box::new(PromptConfirm)
    };
    let prompt = format!("Delete {} resource(s) from the connector?", plan.len());
    if !confirm.confirm(&prompt)? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(());
    }

    let mut progress = ConsoleProgress::new(ctx.quiet);
    let Workspace {
        manifest, state, ..
    } = &mut ws;
    let report = converge(
        &client,
        manifest,
        state,
        Mode::Destroy,
        target,
        &ExecuteOptions::default(),
        &mut progress,
    )?;
    finish(&mut ws, &report, "Destroy", false)
}

/// Adopt an existing remote record
pub fn import(ctx: &Context, address: &str, id: &str) -> Result<()> {
    let (kind, name) = parse_address(address)?;
    let mut ws = Workspace::load(ctx)?;
    let client = ws.client()?;

    let Workspace {
        manifest, state, ..
    } = &mut ws;
    let diagnostics = match kind {
        Kind::Asset => adopt(&AssetResource::new(&client), name, id, manifest, state),
        Kind::Policy => adopt(&PolicyResource::new(&client), name, id, manifest, state),
        Kind::ContractDefinition => adopt(
            &ContractDefinitionResource::new(&client),
            name,
            id,
            manifest,
            state,
        ),
    };

    ui::diagnostics(Some(address), &diagnostics);
    if diagnostics.has_error() {
        anyhow::bail!("Import of {address} failed");
    }

    ws.save()?;
    ui::success(&format!("Imported {address} (id {id})"));
    Ok(())
}
