//! CLI output formatting

use crate::{
    core::{DeployPlan, FailurePolicy, RunStatus},
    execution::DeployEvent,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a spinner shown while a wait step sleeps or polls
pub fn create_wait_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format a run status for display
pub fn format_status(status: RunStatus) -> String {
    match status {
        RunStatus::Pending => style("PENDING").dim().to_string(),
        RunStatus::Running => style("RUNNING").yellow().to_string(),
        RunStatus::Completed => style("COMPLETED").green().to_string(),
        RunStatus::Failed => style("FAILED").red().to_string(),
    }
}

fn format_policy(policy: FailurePolicy) -> String {
    match policy {
        FailurePolicy::Abort => style("abort").red().to_string(),
        FailurePolicy::Warn => style("warn").yellow().to_string(),
        FailurePolicy::Ignore => style("ignore").dim().to_string(),
    }
}

/// Format the ordered plan for display
pub fn format_plan(plan: &DeployPlan) -> String {
    let mut out = format!("{} Plan: {}\n", INFO, style(&plan.name).bold());
    for (i, step) in plan.steps.iter().enumerate() {
        out.push_str(&format!(
            "  {:>2}. {} [{}]\n      {}\n",
            i + 1,
            style(&step.id).cyan(),
            format_policy(step.policy),
            style(step.action.describe()).dim()
        ));
    }
    out
}

/// Format a deploy event for display
///
/// Returns `None` for events that produce no line of their own (wait
/// start/finish drive the spinner; successful steps are reported by
/// `StepSucceeded` only).
pub fn format_deploy_event(event: &DeployEvent, verbose: bool) -> Option<String> {
    match event {
        DeployEvent::RunStarted {
            run_id,
            name,
            total_steps,
        } => Some(format!(
            "{} Post-deploy setup for {} ({} steps, run {})",
            ROCKET,
            style(name).bold(),
            total_steps,
            style(&run_id.to_string()[..8]).dim()
        )),
        DeployEvent::StepStarted {
            label,
            index,
            total,
            ..
        } => verbose.then(|| {
            format!(
                "{} {} {}",
                SPINNER,
                style(format!("[{}/{}]", index, total)).dim(),
                label
            )
        }),
        DeployEvent::WaitStarted { .. } | DeployEvent::WaitFinished { .. } => None,
        DeployEvent::StepSucceeded { label, output, .. } => {
            let mut line = format!("{} {}", CHECK, style(label).green());
            if verbose && !output.trim().is_empty() {
                line.push('\n');
                line.push_str(&indent(&format_output(output, 10)));
            }
            Some(line)
        }
        DeployEvent::StepSkipped { label, reason, .. } => Some(format!(
            "{} {} ({})",
            SKIP,
            style(label).dim(),
            style(reason).dim()
        )),
        DeployEvent::StepWarned { label, error, .. } => Some(format!(
            "{} {}: {}",
            WARN,
            style(label).yellow(),
            style(error).dim()
        )),
        DeployEvent::StepIgnored { label, error, .. } => verbose.then(|| {
            format!(
                "{} {} (ignored: {})",
                INFO,
                style(label).dim(),
                style(error).dim()
            )
        }),
        DeployEvent::StepFailed {
            label,
            error,
            output,
            ..
        } => {
            let mut line = format!("{} {}: {}", CROSS, style(label).red(), error);
            if let Some(output) = output {
                line.push_str(&format!("\n{}\n", style("Captured output:").bold()));
                line.push_str(&indent(output));
            }
            Some(line)
        }
        DeployEvent::Banner { title, lines } => Some(format_banner(title, lines)),
        DeployEvent::RunFinished { run_id, status } => Some(format!(
            "{} Run {} {}",
            INFO,
            style(&run_id.to_string()[..8]).dim(),
            format_status(*status)
        )),
    }
}

/// Format the closing banner
pub fn format_banner(title: &str, lines: &[String]) -> String {
    let rule = "=".repeat(60);
    let mut out = format!("\n{}\n  {}\n{}\n", rule, style(title).green().bold(), rule);
    if !lines.is_empty() {
        out.push_str(&format!("{}\n", style("Next steps:").bold()));
        for (i, line) in lines.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, line));
        }
    }
    out.push_str(&rule);
    out
}

/// Format step output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{}... ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|l| format!("    {}", l))
        .collect::<Vec<_>>()
        .join("\n")
}
