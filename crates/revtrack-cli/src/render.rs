//! Terminal rendering of report views

use revtrack_core::Protocol;
use revtrack_report::{AssignmentRow, PeriodTally, QueueEntry, ReviewerStats, SpeedStat};
use serde::Serialize;

/// Print a value as pretty JSON or through a text renderer
pub(crate) fn emit<T: Serialize + ?Sized>(
    value: &T,
    json: bool,
    text: impl FnOnce(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", text(value));
    }
    Ok(())
}

pub(crate) fn assignment_rows(title: &str, rows: &[AssignmentRow]) -> String {
    let mut out = format!("=== {title} ({}) ===\n", rows.len());
    for row in rows {
        out.push_str(&format!(
            "{}  {:<28} {:<24} {:<10} {}\n",
            row.due_date,
            row.reference.to_string(),
            row.reviewer_name,
            row.reviewer_id,
            row.document_type.as_deref().unwrap_or("-"),
        ));
    }
    out
}

pub(crate) fn reviewer_table(stats: &[ReviewerStats], speed: &[SpeedStat]) -> String {
    let mut out = String::from("=== Reviewer Workload ===\n");
    for r in stats {
        out.push_str(&format!(
            "{:<10} {:<24} assigned {:>3}  completed {:>3}  pending {:>3}  overdue {:>3}\n",
            r.reviewer_id,
            r.reviewer_name,
            r.assigned,
            r.completed,
            r.pending(),
            r.overdue
        ));
    }
    out.push_str("\n=== Completion Speed (days vs. due, fastest first) ===\n");
    if speed.is_empty() {
        out.push_str("(no reviewer has enough completed reviews)\n");
    }
    for s in speed {
        out.push_str(&format!(
            "{:<10} {:<24} {:>+7.1}  ({} dated of {} completed)\n",
            s.reviewer_id, s.reviewer_name, s.mean_completion_days, s.samples, s.completed
        ));
    }
    out
}

pub(crate) fn period_table(periods: &[PeriodTally]) -> String {
    let mut out = String::from("=== Completion by Release Period ===\n");
    for p in periods {
        out.push_str(&format!(
            "{:<28} completed {:>3}  open {:>3}\n",
            p.period, p.completed, p.not_completed
        ));
    }
    out
}

pub(crate) fn queue_table(entries: &[QueueEntry]) -> String {
    let mut out = format!("=== Review Queue ({}) ===\n", entries.len());
    for e in entries {
        let due = e.due_date.map_or_else(|| "no date".to_string(), |d| d.to_string());
        let flag = if e.matched_by.is_fuzzy() { "  [name match]" } else { "" };
        out.push_str(&format!(
            "{:<10} {:<28} {:<12} {:?}{}\n",
            due,
            e.reference.to_string(),
            e.status.as_str(),
            e.urgency,
            flag
        ));
    }
    out
}

pub(crate) fn protocol_detail(protocol: &Protocol) -> String {
    let mut out = format!(
        "{} ({}) - {}\n",
        protocol.name,
        protocol.reference(),
        revtrack_core::aggregate_status(protocol)
    );
    for a in &protocol.assignments {
        out.push_str(&format!(
            "  {:<24} {:<10} {:<12} due {}\n",
            a.reviewer_name,
            a.reviewer_id,
            a.status.as_str(),
            protocol
                .effective_due_date(a)
                .map_or_else(|| "-".to_string(), |d| d.to_string())
        ));
    }
    out
}
