//! All report views in one bundle

use crate::deadlines::{due_soon_assignments, overdue_assignments, AssignmentRow};
use crate::periods::{completion_by_period, PeriodTally};
use crate::stats::{reviewer_stats, speed_rankings, ReviewerStats, SpeedStat};
use crate::summary::{summarize_all, ProtocolSummary};
use chrono::NaiveDate;
use revtrack_core::{AsCalendarDate, EngineConfig, Protocol, Urgency};
use serde::Serialize;
use std::fmt::Write as _;
use std::time::Instant;

/// Every dashboard view, computed as of one date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    /// Date the views were computed for
    pub today: NaiveDate,
    /// Per-protocol badges, most urgent first
    pub protocols: Vec<ProtocolSummary>,
    /// Pending assignments past due
    pub overdue: Vec<AssignmentRow>,
    /// Pending assignments inside the due-soon window
    pub due_soon: Vec<AssignmentRow>,
    /// Workload per reviewer
    pub reviewers: Vec<ReviewerStats>,
    /// Mean completion offsets, fastest first
    pub speed: Vec<SpeedStat>,
    /// Completion tally per release period
    pub periods: Vec<PeriodTally>,
}

impl Dashboard {
    /// Build every view from normalized protocols
    #[must_use]
    pub fn build(protocols: &[Protocol], now: impl AsCalendarDate, config: &EngineConfig) -> Self {
        let started = Instant::now();
        let today = now.calendar_date();
        let policy = config.temporal_policy();

        let dashboard = Self {
            today,
            protocols: summarize_all(protocols, today, &policy),
            overdue: overdue_assignments(protocols, today),
            due_soon: due_soon_assignments(protocols, today, &policy),
            reviewers: reviewer_stats(protocols, today),
            speed: speed_rankings(protocols, config.min_completed_for_speed),
            periods: completion_by_period(protocols, config),
        };

        tracing::info!(
            %today,
            protocols = protocols.len(),
            overdue = dashboard.overdue.len(),
            due_soon = dashboard.due_soon.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "built dashboard"
        );
        dashboard
    }

    /// Number of protocols carrying the given badge
    #[must_use]
    pub fn count(&self, urgency: Urgency) -> usize {
        self.protocols.iter().filter(|p| p.urgency == urgency).count()
    }

    /// Plain-text rendering for terminals
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        let _ = writeln!(report, "=== Review Dashboard ({}) ===\n", self.today);
        let _ = writeln!(report, "Protocols: {}", self.protocols.len());
        let _ = writeln!(report, "  Overdue: {}", self.count(Urgency::Overdue));
        let _ = writeln!(report, "  Due soon: {}", self.count(Urgency::DueSoon));
        let _ = writeln!(report, "  On track: {}", self.count(Urgency::OnTrack));
        let _ = writeln!(report, "  Undated: {}", self.count(Urgency::Undated));
        let _ = writeln!(report, "  Done: {}", self.count(Urgency::Done));

        let _ = writeln!(report, "\n=== Overdue Reviews ({}) ===", self.overdue.len());
        for row in &self.overdue {
            let _ = writeln!(
                report,
                "{}  {:<20} {} ({})",
                row.due_date,
                row.reference.to_string(),
                row.reviewer_name,
                row.reviewer_id
            );
        }

        let _ = writeln!(report, "\n=== Due Soon ({}) ===", self.due_soon.len());
        for row in &self.due_soon {
            let _ = writeln!(
                report,
                "{}  {:<20} {} ({})",
                row.due_date,
                row.reference.to_string(),
                row.reviewer_name,
                row.reviewer_id
            );
        }

        let _ = writeln!(report, "\n=== Reviewers ===");
        for r in &self.reviewers {
            let _ = writeln!(
                report,
                "{:<24} assigned {:>3}  completed {:>3}  overdue {:>3}",
                r.reviewer_name, r.assigned, r.completed, r.overdue
            );
        }

        if !self.speed.is_empty() {
            let _ = writeln!(report, "\n=== Completion Speed (days vs. due) ===");
            for s in &self.speed {
                let _ = writeln!(
                    report,
                    "{:<24} {:>+7.1}  ({} dated of {} completed)",
                    s.reviewer_name, s.mean_completion_days, s.samples, s.completed
                );
            }
        }

        let _ = writeln!(report, "\n=== Release Periods ===");
        for p in &self.periods {
            let _ = writeln!(
                report,
                "{:<24} {}/{} completed",
                p.period,
                p.completed,
                p.total()
            );
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revtrack_core::ReviewerAssignment;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn scenario_b_shows_both_assignments_overdue() {
        let protocol = Protocol::new("P-B", "Scenario B")
            .with_assignment(ReviewerAssignment::new("R1", "Dr. Yu").with_due_date(ymd(2024, 1, 1)))
            .with_assignment(ReviewerAssignment::new("R2", "Dr. Lee").with_due_date(ymd(2024, 2, 1)));
        let dashboard = Dashboard::build(&[protocol], ymd(2024, 5, 1), &EngineConfig::default());

        assert_eq!(dashboard.overdue.len(), 2);
        assert_eq!(dashboard.protocols[0].due_date, Some(ymd(2024, 2, 1)));
        assert_eq!(dashboard.count(Urgency::Overdue), 1);
        assert!(dashboard.due_soon.is_empty());
    }

    #[test]
    fn text_rendering_lists_sections() {
        let protocol = Protocol::new("P-1", "Sleep study")
            .with_release_period("First Release")
            .with_assignment(ReviewerAssignment::new("R1", "Dr. Yu").with_due_date(ymd(2024, 4, 1)));
        let text = Dashboard::build(&[protocol], ymd(2024, 5, 1), &EngineConfig::default()).generate_text();

        assert!(text.contains("=== Overdue Reviews (1) ==="));
        assert!(text.contains("2024-04-01  P-1"));
        assert!(text.contains("First Release"));
        assert!(!text.contains("Completion Speed"));
    }
}
