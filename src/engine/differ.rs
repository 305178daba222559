//! Plan display

use colored::{ColoredString, Colorize};
use declarative::{Action, AttributeChange, ExecutionPlan, PlannedChange};

fn symbol(action: Action) -> ColoredString {
    match action {
        Action::Create => "+".green(),
        Action::Update => "~".yellow(),
        Action::Replace => "-/+".magenta(),
        Action::Delete => "-".red(),
        Action::NoOp => " ".normal(),
    }
}

fn attribute_line(action: Action, change: &AttributeChange) -> String {
    let body = match action {
        Action::Create => change.after_display(),
        Action::Delete => change.before_display(),
        _ => format!("{} -> {}", change.before_display(), change.after_display()),
    };
    let mut line = format!("      {:<10} {}", format!("{}:", change.name), body);
    if change.forces_replacement {
        line.push_str(&format!(" {}", "(forces replacement)".red()));
    }
    line
}

/// Lines describing one planned instance.
pub fn render_change(change: &PlannedChange) -> Vec<String> {
    let tainted = change.prior.as_ref().is_some_and(|p| p.tainted);
    let mut header = format!(
        "  {} {} {}",
        symbol(change.action),
        change.address.to_string().bold(),
        format!("({})", change.action.verb()).dimmed()
    );
    if tainted {
        header.push_str(&format!(" {}", "[tainted]".red()));
    }

    let mut lines = vec![header];
    lines.extend(
        change
            .changes
            .iter()
            .map(|c| attribute_line(change.action, c)),
    );
    lines
}

/// Lines for the whole plan, pending instances only.
pub fn render_plan(plan: &ExecutionPlan) -> Vec<String> {
    let mut lines = Vec::new();
    for change in plan.pending() {
        lines.extend(render_change(change));
        lines.push(String::new());
    }
    lines
}

/// Print the plan followed by its summary line.
pub fn display_plan(plan: &ExecutionPlan) {
    if plan.is_empty() {
        println!();
        println!("  {} No changes. Infrastructure matches the configuration.", "✓".green());
        return;
    }

    println!();
    for line in render_plan(plan) {
        println!("{line}");
    }
    println!("  {} {}", "Plan:".bold(), plan.summary());
}
