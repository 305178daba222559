//! Execution with terminal UI: confirmation prompt, progress bar, summary

use anyhow::Result;
use colored::Colorize;
use declarative::{
    Action, Address, ApplyResult, AutoConfirm, ConfirmCallback, ExecuteOptions, ExecuteReport,
    ExecuteSummary, ExecutionPlan, ProgressCallback, Provider,
};
use gitlab::Client;
use indicatif::ProgressBar;

use crate::progress;
use crate::state::StateFile;
use crate::ui;

/// Asks on the terminal before apply.
pub struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        use dialoguer::Confirm;

        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;

        Ok(confirmed)
    }
}

/// Progress bar updated from worker threads.
pub struct BarProgress {
    quiet: bool,
    bar: std::sync::OnceLock<ProgressBar>,
}

impl BarProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            bar: std::sync::OnceLock::new(),
        }
    }
}

impl ProgressCallback for BarProgress {
    fn on_start(&self, total: usize) {
        let _ = self
            .bar
            .set(progress::bar(total as u64, "Applying", self.quiet));
    }

    fn on_instance_start(&self, address: &Address, action: Action) {
        if let Some(pb) = self.bar.get() {
            pb.set_message(format!("{action} {address}"));
        }
    }

    fn on_instance_complete(&self, address: &Address, result: &ApplyResult) {
        let Some(pb) = self.bar.get() else {
            return;
        };
        let symbol = match result {
            ApplyResult::NoChange => "○".dimmed(),
            ApplyResult::Created
            | ApplyResult::Modified
            | ApplyResult::Replaced
            | ApplyResult::Removed => "✓".green(),
            ApplyResult::Failed { .. } => "✗".red(),
            ApplyResult::Skipped { .. } => "⊘".yellow(),
        };
        pb.println(format!("  {symbol} {address}"));
        pb.inc(1);
    }

    fn on_finish(&self) {
        if let Some(pb) = self.bar.get() {
            pb.finish_and_clear();
        }
    }
}

/// Options for a CLI apply run
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub execute: ExecuteOptions,
    /// Skip confirmation prompts
    pub yes: bool,
    pub quiet: bool,
}

/// Run the plan and fold every outcome into `state`.
///
/// The caller persists `state` afterwards, whether or not instances failed.
pub fn apply(
    provider: &Provider<Client>,
    plan: &ExecutionPlan,
    state: &mut StateFile,
    opts: &ApplyOptions,
) -> Result<ExecuteReport> {
    let progress = BarProgress::new(opts.quiet);
    let report = if opts.yes {
        declarative::execute(provider, plan, &opts.execute, &progress, &mut AutoConfirm)?
    } else {
        declarative::execute(provider, plan, &opts.execute, &progress, &mut PromptConfirm)?
    };

    for outcome in &report.outcomes {
        if let ApplyResult::Failed { error } = &outcome.result {
            ui::error(&format!("{}: {error}", outcome.address));
        }
        state.apply_outcome(outcome);
    }

    Ok(report)
}

/// Print final summary
pub fn print_summary(summary: &ExecuteSummary, dry_run: bool) {
    println!();
    if dry_run {
        println!("  {} Dry run - no changes made", "ℹ".blue());
        return;
    }
    if summary.total() == 0 {
        return;
    }

    if summary.is_success() {
        println!("  {} Apply complete!", "✓".green().bold());
    } else {
        println!("  {} Apply finished with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} created", ui::count(summary.created, "variable"));
    }
    if summary.modified > 0 {
        println!("    • {} modified", ui::count(summary.modified, "variable"));
    }
    if summary.replaced > 0 {
        println!("    • {} replaced", ui::count(summary.replaced, "variable"));
    }
    if summary.removed > 0 {
        println!("    • {} destroyed", ui::count(summary.removed, "variable"));
    }
    if summary.skipped > 0 {
        println!("    • {} skipped", ui::count(summary.skipped, "variable"));
    }
    if summary.failed > 0 {
        println!(
            "    • {} {}",
            ui::count(summary.failed, "variable"),
            "failed".red()
        );
    }
}
