//! `plan`, `apply`, `destroy` and `refresh`

use anyhow::Result;
use declarative::{ExecuteOptions, ExecuteReport, ExecutionPlan};

use super::Session;
use crate::Context;
use crate::cli::{ApplyArgs, DestroyArgs};
use crate::engine::{self, ApplyOptions};
use crate::ui;

pub fn plan(ctx: &Context, target: Option<&str>) -> Result<()> {
    let mut session = Session::open(ctx, true)?;
    let plan = session.plan(target, ctx.quiet)?;
    engine::display_plan(&plan);
    Ok(())
}

pub fn apply(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    let mut session = Session::open(ctx, true)?;
    let report = run_apply(&mut session, args, ctx.quiet)?;
    finish(&report, args.dry_run)
}

/// Refresh, plan, apply and save state.
///
/// State is saved even when some instances fail, so partial progress is
/// kept. A dry run saves nothing.
pub fn run_apply(session: &mut Session, args: &ApplyArgs, quiet: bool) -> Result<ExecuteReport> {
    let plan = session.plan(args.target.as_deref(), quiet)?;
    engine::display_plan(&plan);

    let opts = ApplyOptions {
        execute: ExecuteOptions {
            dry_run: args.dry_run,
            jobs: args.jobs,
        },
        yes: args.yes,
        quiet,
    };
    execute_and_save(session, &plan, &opts)
}

pub fn destroy(ctx: &Context, args: &DestroyArgs) -> Result<()> {
    let mut session = Session::open(ctx, false)?;
    let report = run_destroy(&mut session, args, ctx.quiet)?;
    finish(&report, false)
}

/// Plan the removal of every instance in state (or the targeted ones).
pub fn run_destroy(
    session: &mut Session,
    args: &DestroyArgs,
    quiet: bool,
) -> Result<ExecuteReport> {
    session.refresh(quiet)?;
    let plan = ExecutionPlan::destroy(&session.provider, &session.state.resources)?
        .filter_by_target(args.target.as_deref());
    engine::display_plan(&plan);

    let opts = ApplyOptions {
        execute: ExecuteOptions::default(),
        yes: args.yes,
        quiet,
    };
    execute_and_save(session, &plan, &opts)
}

pub fn refresh(ctx: &Context) -> Result<()> {
    let mut session = Session::open(ctx, false)?;
    let total = session.state.resources.len();
    let vanished = session.refresh(ctx.quiet)?;
    session.save()?;

    ui::success(&format!(
        "Refreshed {} ({} removed from state)",
        ui::count(total, "instance"),
        vanished.len()
    ));
    Ok(())
}

fn execute_and_save(
    session: &mut Session,
    plan: &ExecutionPlan,
    opts: &ApplyOptions,
) -> Result<ExecuteReport> {
    let report = engine::apply(&session.provider, plan, &mut session.state, opts)?;
    if !opts.execute.dry_run {
        session.save()?;
    }
    Ok(report)
}

fn finish(report: &ExecuteReport, dry_run: bool) -> Result<()> {
    engine::print_summary(&report.summary, dry_run);
    if !report.summary.is_success() {
        anyhow::bail!(
            "{} could not be applied",
            ui::count(report.summary.failed, "variable")
        );
    }
    Ok(())
}
