//! Execution engine - runs lifecycle handlers for a plan
//!
//! Instances are applied concurrently on a rayon pool; the handlers of a
//! single instance always run in order on one worker.

use crate::context::{ConfirmCallback, ProgressCallback};
use crate::data::ResourceData;
use crate::planner::{Action, ExecutionPlan, PlannedChange};
use crate::resource::{Provider, Resource};
use crate::types::{Address, ApplyResult, Attributes, ExecuteOptions, ExecuteSummary, InstanceState};
use anyhow::Result;
use rayon::prelude::*;

/// How the persisted state of an instance changes after apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    /// Keep whatever was stored before
    Unchanged,
    /// Store this state
    Set(InstanceState),
    /// Forget the instance
    Remove,
}

#[derive(Debug, Clone)]
pub struct InstanceOutcome {
    pub address: Address,
    pub action: Action,
    pub result: ApplyResult,
    pub state: StateChange,
}

impl InstanceOutcome {
    fn new(change: &PlannedChange, result: ApplyResult, state: StateChange) -> Self {
        Self {
            address: change.address.clone(),
            action: change.action,
            result,
            state,
        }
    }
}

/// Per-instance outcomes, in plan order, plus totals.
#[derive(Debug, Clone, Default)]
pub struct ExecuteReport {
    pub outcomes: Vec<InstanceOutcome>,
    pub summary: ExecuteSummary,
}

impl ExecuteReport {
    fn from_outcomes(outcomes: Vec<InstanceOutcome>) -> Self {
        let mut summary = ExecuteSummary::default();
        for outcome in &outcomes {
            summary.add_result(&outcome.result);
        }
        Self { outcomes, summary }
    }

    fn skipped(plan: &ExecutionPlan, reason: &str) -> Self {
        Self::from_outcomes(
            plan.pending()
                .map(|change| {
                    InstanceOutcome::new(
                        change,
                        ApplyResult::Skipped {
                            reason: reason.to_string(),
                        },
                        StateChange::Unchanged,
                    )
                })
                .collect(),
        )
    }
}

/// Execute a plan with the given options and callbacks
///
/// Asks for confirmation once before touching anything. A dry run or a
/// declined confirmation reports every pending instance as skipped.
pub fn execute<M, P, C>(
    provider: &Provider<M>,
    plan: &ExecutionPlan,
    opts: &ExecuteOptions,
    progress: &P,
    confirm: &mut C,
) -> Result<ExecuteReport>
where
    M: Sync,
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let pending: Vec<&PlannedChange> = plan.pending().collect();
    if pending.is_empty() {
        return Ok(ExecuteReport::default());
    }

    if opts.dry_run {
        return Ok(ExecuteReport::skipped(plan, "dry run"));
    }

    if !confirm.confirm("Apply these changes?")? {
        return Ok(ExecuteReport::skipped(plan, "not confirmed"));
    }

    // Resolve every type up front so a bad plan fails before any handler runs.
    let resources = pending
        .iter()
        .map(|change| provider.resource(&change.address.resource_type))
        .collect::<crate::Result<Vec<_>>>()?;

    progress.on_start(pending.len());

    let jobs = opts.jobs.max(1);
    let outcomes: Vec<InstanceOutcome> = if jobs == 1 || pending.len() == 1 {
        pending
            .iter()
            .zip(&resources)
            .map(|(change, resource)| apply_reporting(*resource, change, provider.meta(), progress))
            .collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {e}"))?;

        pool.install(|| {
            pending
                .par_iter()
                .zip(resources.par_iter())
                .map(|(change, resource)| {
                    apply_reporting(*resource, change, provider.meta(), progress)
                })
                .collect()
        })
    };

    progress.on_finish();
    Ok(ExecuteReport::from_outcomes(outcomes))
}

fn apply_reporting<M: Sync, P: ProgressCallback>(
    resource: &dyn Resource<Meta = M>,
    change: &PlannedChange,
    meta: &M,
    progress: &P,
) -> InstanceOutcome {
    progress.on_instance_start(&change.address, change.action);
    let outcome = apply_change(resource, change, meta);
    match &outcome.result {
        ApplyResult::Failed { error } => log::error!("{}: {error}", change.address),
        result => log::info!("{}: {:?}", change.address, result),
    }
    progress.on_instance_complete(&change.address, &outcome.result);
    outcome
}

/// Apply a single planned change.
pub fn apply_change<M: Sync>(
    resource: &dyn Resource<Meta = M>,
    change: &PlannedChange,
    meta: &M,
) -> InstanceOutcome {
    let desired = change.desired.as_ref();
    let prior = change.prior.as_ref();

    let (result, state) = match (change.action, prior, desired) {
        (Action::NoOp, _, _) => (ApplyResult::NoChange, StateChange::Unchanged),
        (Action::Create, _, Some(desired)) => create(resource, desired, meta, ApplyResult::Created),
        (Action::Update, Some(prior), Some(desired)) => update(resource, prior, desired, meta),
        (Action::Delete, Some(prior), _) => match delete(resource, prior, meta) {
            Ok(()) => (ApplyResult::Removed, StateChange::Remove),
            Err(result) => (result, StateChange::Unchanged),
        },
        (Action::Replace, Some(prior), Some(desired)) => match delete(resource, prior, meta) {
            Ok(()) => create(resource, desired, meta, ApplyResult::Replaced),
            Err(result) => (result, StateChange::Unchanged),
        },
        (action, _, _) => (
            ApplyResult::Failed {
                error: format!("inconsistent plan: cannot {action} without the required state"),
            },
            StateChange::Unchanged,
        ),
    };

    InstanceOutcome::new(change, result, state)
}

fn failed(err: &anyhow::Error) -> ApplyResult {
    ApplyResult::Failed {
        error: format!("{err:#}"),
    }
}

fn create<M: Sync>(
    resource: &dyn Resource<Meta = M>,
    desired: &Attributes,
    meta: &M,
    success: ApplyResult,
) -> (ApplyResult, StateChange) {
    let mut data = ResourceData::from_attributes(resource.schema(), desired.clone());

    match resource.create(&mut data, meta) {
        Ok(()) if data.is_gone() => (
            ApplyResult::Failed {
                error: "object was created but could not be read back".to_string(),
            },
            StateChange::Remove,
        ),
        Ok(()) => (success, StateChange::Set(data.to_state(resource.type_name()))),
        // The remote object exists but the instance is incomplete; keep it
        // so the next plan replaces it.
        Err(err) if !data.is_gone() => {
            let mut state = data.to_state(resource.type_name());
            state.tainted = true;
            (failed(&err), StateChange::Set(state))
        }
        Err(err) => (failed(&err), StateChange::Remove),
    }
}

fn update<M: Sync>(
    resource: &dyn Resource<Meta = M>,
    prior: &InstanceState,
    desired: &Attributes,
    meta: &M,
) -> (ApplyResult, StateChange) {
    let mut data = ResourceData::from_attributes(resource.schema(), desired.clone());
    data.set_id(&prior.id);

    match resource.update(&mut data, meta) {
        Ok(()) if data.is_gone() => (
            ApplyResult::Skipped {
                reason: "remote object no longer exists".to_string(),
            },
            StateChange::Remove,
        ),
        Ok(()) => (
            ApplyResult::Modified,
            StateChange::Set(data.to_state(resource.type_name())),
        ),
        Err(err) => (failed(&err), StateChange::Unchanged),
    }
}

fn delete<M: Sync>(
    resource: &dyn Resource<Meta = M>,
    prior: &InstanceState,
    meta: &M,
) -> std::result::Result<(), ApplyResult> {
    let mut data = ResourceData::from_state(resource.schema(), prior);
    resource.delete(&mut data, meta).map_err(|err| failed(&err))
}
