//! Terminal output for the CLI

pub mod progress;

pub use progress::ProgressReporter;

use crate::diff::SyncPlan;
use crate::types::{Replication, StatusReport, SyncAction, SyncStats};
use console::style;

/// One-line summary of a finished sync
pub fn format_stats(replication: &Replication, stats: &SyncStats) -> String {
    let label = if stats.is_clean() {
        style("✓").green()
    } else {
        style("!").yellow()
    };
    format!(
        "{} {} → {}\n  {}",
        label,
        replication.source.display(),
        replication.destination.display(),
        stats
    )
}

/// Counts line for a planned sync
pub fn format_plan_preview(plan: &SyncPlan) -> String {
    format!(
        "Plan:\n  Copy: {}  Update: {}  Delete: {}  Skip: {}",
        plan.stats.create_count,
        plan.stats.update_count,
        plan.stats.delete_count,
        plan.stats.skip_count,
    )
}

/// Every non-skip action of a plan, one per line
pub fn format_dry_run_actions(plan: &SyncPlan) -> String {
    if plan.is_noop() {
        return "Dry-run actions:\n  (no planned actions)".to_string();
    }

    let mut lines = Vec::with_capacity(plan.actions.len() + 1);
    lines.push("Dry-run actions:".to_string());
    for action in plan.actions.iter().filter(|a| a.is_transfer() || a.is_delete()) {
        let tag = match action {
            SyncAction::CopyNew(_) => "COPY",
            SyncAction::Overwrite(_) => "UPDATE",
            _ => "DELETE",
        };
        lines.push(format!("  {:<9} {}", tag, action.path().display()));
    }

    if plan.stats.skip_count > 0 {
        lines.push(format!(
            "  ({} unchanged file(s) omitted)",
            plan.stats.skip_count
        ));
    }
    lines.join("\n")
}

/// Human-readable status block for one replication
pub fn format_status(replication: &Replication, report: &StatusReport) -> String {
    let last_sync = report
        .last_sync
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    let mut lines = vec![
        format!(
            "{} → {}",
            style(replication.source.display()).bold(),
            replication.destination.display()
        ),
        format!("  Last sync:       {}", last_sync),
        format!("  Source files:    {}", report.source_files),
        format!("  Dest files:      {}", report.dest_files),
        format!("  Pending changes: {}", report.pending_changes),
    ];
    if report.errors > 0 {
        lines.push(format!("  {}", style(format!("Errors: {}", report.errors)).red()));
    }
    if !replication.exclusions.is_empty() {
        lines.push(format!("  Exclusions:      {}", replication.exclusions.join(", ")));
    }
    lines.join("\n")
}
