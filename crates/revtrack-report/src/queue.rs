//! One reviewer's work queue
//!
//! Collects every assignment the identity matcher ties to a reviewer, across
//! all protocols. Substring matches are included but carry their
//! [`MatchKind`] so the caller can tell them apart from exact ones.

use chrono::NaiveDate;
use revtrack_core::identity::assignment_match;
use revtrack_core::{
    AsCalendarDate, MatchKind, Protocol, ProtocolRef, ReviewStatus, ReviewerIdentity,
    TemporalPolicy, Urgency,
};
use serde::Serialize;

/// One assignment in a reviewer's queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueEntry {
    /// Protocol id
    pub protocol_id: String,
    /// Protocol display name
    pub protocol_name: String,
    /// Where the protocol is stored
    pub reference: ProtocolRef,
    /// Form or document type under review
    pub document_type: Option<String>,
    /// Review state of this assignment
    pub status: ReviewStatus,
    /// Effective due date
    pub due_date: Option<NaiveDate>,
    /// Badge for `due_date`
    pub urgency: Urgency,
    /// Rule that tied the assignment to the reviewer
    pub matched_by: MatchKind,
}

/// Every assignment held by `reviewer`, overdue first then by date
#[must_use]
pub fn reviewer_queue(
    protocols: &[Protocol],
    reviewer: &ReviewerIdentity,
    now: impl AsCalendarDate,
    policy: &TemporalPolicy,
) -> Vec<QueueEntry> {
    let today = now.calendar_date();
    let mut queue: Vec<QueueEntry> = protocols
        .iter()
        .flat_map(|protocol| {
            protocol.assignments.iter().filter_map(move |assignment| {
                let matched_by = assignment_match(assignment, reviewer)?;
                let due_date = protocol.effective_due_date(assignment);
                Some(QueueEntry {
                    protocol_id: protocol.id.clone(),
                    protocol_name: protocol.name.clone(),
                    reference: protocol.reference(),
                    document_type: assignment
                        .document_type
                        .clone()
                        .or_else(|| protocol.document_type.clone()),
                    status: assignment.status,
                    due_date,
                    urgency: policy.urgency(due_date, assignment.is_completed(), today),
                    matched_by,
                })
            })
        })
        .collect();

    if queue.iter().any(|entry| entry.matched_by.is_fuzzy()) {
        tracing::debug!(reviewer = %reviewer, "queue includes name-substring matches");
    }

    queue.sort_by(|a, b| {
        a.urgency
            .cmp(&b.urgency)
            .then_with(|| (a.due_date.is_none(), a.due_date).cmp(&(b.due_date.is_none(), b.due_date)))
            .then_with(|| a.protocol_id.cmp(&b.protocol_id))
    });
    queue
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use revtrack_core::ReviewerAssignment;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn queue_collects_matches_across_protocols() {
        let protocols = vec![
            Protocol::new("P-1", "Later")
                .with_assignment(ReviewerAssignment::new("R1", "Dr. Ester Yu").with_due_date(ymd(2024, 6, 1))),
            Protocol::new("P-2", "Late")
                .with_due_date(ymd(2024, 4, 1))
                .with_assignment(ReviewerAssignment::new("legacy-7", "Ester Yu"))
                .with_assignment(ReviewerAssignment::new("R2", "Dr. Rogelio Fermin")),
            Protocol::new("P-3", "Done").with_assignment(
                ReviewerAssignment::new("R1", "Dr. Ester Yu")
                    .with_due_date(ymd(2024, 1, 1))
                    .completed_on(ymd(2024, 1, 2)),
            ),
        ];
        let queue = reviewer_queue(
            &protocols,
            &ReviewerIdentity::new("R1", "Dr. Ester Yu"),
            ymd(2024, 5, 1),
            &TemporalPolicy::default(),
        );

        let rows: Vec<(&str, Urgency, MatchKind)> = queue
            .iter()
            .map(|e| (e.protocol_id.as_str(), e.urgency, e.matched_by))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("P-2", Urgency::Overdue, MatchKind::AssignmentInCandidate),
                ("P-1", Urgency::OnTrack, MatchKind::ExactId),
                ("P-3", Urgency::Done, MatchKind::ExactId),
            ]
        );
        assert_eq!(queue[0].due_date, Some(ymd(2024, 4, 1)));
    }

    #[test]
    fn unknown_reviewer_has_empty_queue() {
        let protocols = vec![Protocol::new("P-1", "A").with_assignment(ReviewerAssignment::new("R1", "Dr. Yu"))];
        let queue = reviewer_queue(
            &protocols,
            &ReviewerIdentity::new("R9", "Dr. Fermin"),
            ymd(2024, 5, 1),
            &TemporalPolicy::default(),
        );
        assert!(queue.is_empty());
    }
}
