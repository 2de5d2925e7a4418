//! Reviewer workload and speed statistics
//!
//! Assignments carrying a code distinct from their name are grouped by that
//! code first. Assignments known only by name (a blank id, or a legacy
//! `reviewer` field repeated as the name) then join the group the identity
//! matcher picks, so one person yields one row here and in the reviewer
//! queue. The first name seen for a group is the one reported.

use chrono::NaiveDate;
use revtrack_core::{
    best_match, AsCalendarDate, Protocol, ReviewerAssignment, ReviewerIdentity, TemporalPolicy,
};
use serde::Serialize;
use std::collections::HashMap;

/// Per-reviewer workload counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewerStats {
    /// Reviewer id
    pub reviewer_id: String,
    /// Reviewer display name
    pub reviewer_name: String,
    /// Assignments held
    pub assigned: usize,
    /// Assignments completed
    pub completed: usize,
    /// Pending assignments past their effective due date
    pub overdue: usize,
}

impl ReviewerStats {
    /// Assignments still pending
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.assigned - self.completed
    }
}

/// Mean completion offset for one reviewer
///
/// `mean_completion_days` is completion date minus due date; negative means
/// early.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedStat {
    /// Reviewer id
    pub reviewer_id: String,
    /// Reviewer display name
    pub reviewer_name: String,
    /// Assignments completed
    pub completed: usize,
    /// Completed assignments with both a due and a completion date
    pub samples: usize,
    /// Mean of completion date − due date, in days
    pub mean_completion_days: f64,
}

type Member<'a> = (&'a Protocol, &'a ReviewerAssignment);

/// Every assignment attributed to one reviewer
struct ReviewerGroup<'a> {
    reviewer_id: String,
    reviewer_name: String,
    members: Vec<Member<'a>>,
}

fn reviewer_key(assignment: &ReviewerAssignment) -> &str {
    if assignment.reviewer_id.is_empty() {
        &assignment.reviewer_name
    } else {
        &assignment.reviewer_id
    }
}

/// Id distinct from the display name
fn is_coded(assignment: &ReviewerAssignment) -> bool {
    !assignment.reviewer_id.is_empty() && assignment.reviewer_id != assignment.reviewer_name
}

fn open_group<'a>(
    groups: &mut Vec<ReviewerGroup<'a>>,
    keys: &mut Vec<ReviewerAssignment>,
    assignment: &ReviewerAssignment,
) -> usize {
    keys.push(ReviewerAssignment::new(
        assignment.reviewer_id.as_str(),
        assignment.reviewer_name.as_str(),
    ));
    groups.push(ReviewerGroup {
        reviewer_id: reviewer_key(assignment).to_string(),
        reviewer_name: assignment.reviewer_name.clone(),
        members: Vec::new(),
    });
    groups.len() - 1
}

fn group_by_reviewer(protocols: &[Protocol]) -> Vec<ReviewerGroup<'_>> {
    let (coded, loose): (Vec<Member<'_>>, Vec<Member<'_>>) = protocols
        .iter()
        .flat_map(|p| p.assignments.iter().map(move |a| (p, a)))
        .filter(|(_, a)| !reviewer_key(a).is_empty())
        .partition(|(_, a)| is_coded(a));

    let mut groups: Vec<ReviewerGroup<'_>> = Vec::new();
    // Representative of each group, parallel to `groups`, for the matcher
    let mut keys: Vec<ReviewerAssignment> = Vec::new();
    let mut by_id: HashMap<&str, usize> = HashMap::new();

    for member in coded {
        let assignment = member.1;
        let idx = match by_id.get(assignment.reviewer_id.as_str()) {
            Some(&idx) => idx,
            None => {
                let idx = open_group(&mut groups, &mut keys, assignment);
                by_id.insert(assignment.reviewer_id.as_str(), idx);
                idx
            }
        };
        groups[idx].members.push(member);
    }

    for member in loose {
        let assignment = member.1;
        let candidate =
            ReviewerIdentity::new(assignment.reviewer_id.as_str(), assignment.reviewer_name.as_str());
        let idx = match best_match(&keys, &candidate) {
            Some((idx, kind)) => {
                if kind.is_fuzzy() {
                    tracing::debug!(
                        reviewer = %candidate,
                        group = %groups[idx].reviewer_id,
                        ?kind,
                        "merged reviewer by name"
                    );
                }
                idx
            }
            None => open_group(&mut groups, &mut keys, assignment),
        };
        groups[idx].members.push(member);
    }

    groups
}

/// Workload counts for every reviewer appearing in any assignment, sorted by reviewer id
#[must_use]
pub fn reviewer_stats(protocols: &[Protocol], now: impl AsCalendarDate) -> Vec<ReviewerStats> {
    let today = now.calendar_date();
    let policy = TemporalPolicy::default();

    let mut stats: Vec<ReviewerStats> = group_by_reviewer(protocols)
        .into_iter()
        .map(|group| {
            let mut row = ReviewerStats {
                reviewer_id: group.reviewer_id,
                reviewer_name: group.reviewer_name,
                assigned: group.members.len(),
                completed: 0,
                overdue: 0,
            };
            for (protocol, assignment) in group.members {
                if assignment.is_completed() {
                    row.completed += 1;
                } else if policy.is_overdue(protocol.effective_due_date(assignment), today) {
                    row.overdue += 1;
                }
            }
            row
        })
        .collect();
    stats.sort_by(|a, b| a.reviewer_id.cmp(&b.reviewer_id));
    stats
}

/// Completion offset of one completed assignment, in days
fn completion_offset(protocol: &Protocol, assignment: &ReviewerAssignment) -> Option<i64> {
    if !assignment.is_completed() {
        return None;
    }
    let due: NaiveDate = protocol.effective_due_date(assignment)?;
    let done = assignment.completed_at?;
    Some((done - due).num_days())
}

/// Mean completion offset per reviewer, fastest first
///
/// Only reviewers with at least `min_completed` completed assignments are
/// ranked; the mean covers those completions that carry both a due and a
/// completion date, and a reviewer with none of those is left out. Ties
/// fall back to reviewer id.
#[must_use]
pub fn speed_rankings(protocols: &[Protocol], min_completed: usize) -> Vec<SpeedStat> {
    let mut ranked: Vec<SpeedStat> = group_by_reviewer(protocols)
        .into_iter()
        .filter_map(|group| {
            let completed = group.members.iter().filter(|(_, a)| a.is_completed()).count();
            let offsets: Vec<i64> = group
                .members
                .iter()
                .filter_map(|&(p, a)| completion_offset(p, a))
                .collect();
            if completed < min_completed || offsets.is_empty() {
                return None;
            }
            Some(SpeedStat {
                reviewer_id: group.reviewer_id,
                reviewer_name: group.reviewer_name,
                completed,
                samples: offsets.len(),
                mean_completion_days: offsets.iter().sum::<i64>() as f64 / offsets.len() as f64,
            })
        })
        .collect();
    ranked.sort_by(|a, b| {
        a.mean_completion_days
            .total_cmp(&b.mean_completion_days)
            .then_with(|| a.reviewer_id.cmp(&b.reviewer_id))
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn done(id: &str, due: NaiveDate, on: NaiveDate) -> ReviewerAssignment {
        ReviewerAssignment::new(id, format!("Reviewer {id}"))
            .with_due_date(due)
            .completed_on(on)
    }

    #[test]
    fn counts_assigned_completed_and_overdue() {
        let protocols = vec![
            Protocol::new("P-1", "A")
                .with_assignment(done("R1", ymd(2024, 1, 10), ymd(2024, 1, 8)))
                .with_assignment(ReviewerAssignment::new("R2", "Reviewer R2").with_due_date(ymd(2024, 1, 1))),
            Protocol::new("P-2", "B")
                .with_due_date(ymd(2024, 3, 1))
                .with_assignment(ReviewerAssignment::new("R1", "Reviewer R1"))
                .with_assignment(ReviewerAssignment::new("", "Dr. Nameonly")),
        ];
        let stats = reviewer_stats(&protocols, ymd(2024, 2, 1));

        assert_eq!(
            stats,
            vec![
                ReviewerStats {
                    reviewer_id: "Dr. Nameonly".into(),
                    reviewer_name: "Dr. Nameonly".into(),
                    assigned: 1,
                    completed: 0,
                    overdue: 0,
                },
                ReviewerStats {
                    reviewer_id: "R1".into(),
                    reviewer_name: "Reviewer R1".into(),
                    assigned: 2,
                    completed: 1,
                    overdue: 0,
                },
                ReviewerStats {
                    reviewer_id: "R2".into(),
                    reviewer_name: "Reviewer R2".into(),
                    assigned: 1,
                    completed: 0,
                    overdue: 1,
                },
            ]
        );
        assert_eq!(stats[1].pending(), 1);
    }

    #[test]
    fn speed_requires_minimum_samples_and_sorts_fastest_first() {
        let due = ymd(2024, 1, 10);
        let protocols = vec![Protocol::new("P-1", "A")
            .with_assignment(done("FAST", due, ymd(2024, 1, 7)))
            .with_assignment(done("FAST", due, ymd(2024, 1, 8)))
            .with_assignment(done("FAST", due, ymd(2024, 1, 9)))
            .with_assignment(done("SLOW", due, ymd(2024, 1, 12)))
            .with_assignment(done("SLOW", due, ymd(2024, 1, 14)))
            .with_assignment(done("SLOW", due, ymd(2024, 1, 16)))
            .with_assignment(done("FEW", due, ymd(2024, 1, 1)))
            .with_assignment(done("FEW", due, ymd(2024, 1, 1)))];

        let ranked = speed_rankings(&protocols, 3);
        let ids: Vec<&str> = ranked.iter().map(|s| s.reviewer_id.as_str()).collect();
        assert_eq!(ids, vec!["FAST", "SLOW"]);
        assert_eq!(ranked[0].mean_completion_days, -2.0);
        assert_eq!(ranked[1].mean_completion_days, 4.0);
        assert_eq!(ranked[1].samples, 3);
    }

    #[test]
    fn threshold_counts_completions_and_mean_uses_dated_ones() {
        let due = ymd(2024, 1, 10);
        let mut undated = ReviewerAssignment::new("R1", "Reviewer R1").with_due_date(due);
        undated.complete(None);
        let protocols = vec![Protocol::new("P-1", "A")
            .with_assignment(done("R1", due, ymd(2024, 1, 8)))
            .with_assignment(done("R1", due, ymd(2024, 1, 12)))
            .with_assignment(undated)];

        let ranked = speed_rankings(&protocols, 3);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].reviewer_id, "R1");
        assert_eq!(ranked[0].completed, 3);
        assert_eq!(ranked[0].samples, 2);
        assert_eq!(ranked[0].mean_completion_days, 0.0);
        assert!(speed_rankings(&protocols, 4).is_empty());
    }

    #[test]
    fn completions_without_dates_are_not_ranked() {
        let mut no_date = ReviewerAssignment::new("R1", "Reviewer R1").with_due_date(ymd(2024, 1, 1));
        no_date.complete(None);
        let protocols = vec![Protocol::new("P-1", "A")
            .with_assignment(no_date.clone())
            .with_assignment(no_date.clone())
            .with_assignment(no_date)];
        assert!(speed_rankings(&protocols, 1).is_empty());
    }

    #[test]
    fn name_only_record_joins_the_coded_reviewer() {
        let protocols = vec![
            Protocol::new("P-1", "Legacy")
                .with_assignment(ReviewerAssignment::new("Dr. Ester Yu", "Dr. Ester Yu")),
            Protocol::new("P-2", "Current")
                .with_assignment(ReviewerAssignment::new("DRAPL-001", "Dr. Ester Yu")),
            Protocol::new("P-3", "Unnamed").with_assignment(ReviewerAssignment::new("", "Ester Yu")),
        ];
        let stats = reviewer_stats(&protocols, ymd(2024, 2, 1));

        assert_eq!(
            stats,
            vec![ReviewerStats {
                reviewer_id: "DRAPL-001".into(),
                reviewer_name: "Dr. Ester Yu".into(),
                assigned: 3,
                completed: 0,
                overdue: 0,
            }]
        );
    }

    #[test]
    fn distinct_codes_never_merge() {
        let protocols = vec![Protocol::new("P-1", "A")
            .with_assignment(ReviewerAssignment::new("R1", "R1"))
            .with_assignment(ReviewerAssignment::new("R12", "R12"))];
        let ids: Vec<String> = reviewer_stats(&protocols, ymd(2024, 2, 1))
            .into_iter()
            .map(|s| s.reviewer_id)
            .collect();
        assert_eq!(ids, vec!["R1".to_string(), "R12".to_string()]);
    }
}
