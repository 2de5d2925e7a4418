//! Overdue and due-soon assignment lists
//!
//! Both lists hold one row per pending assignment, keyed on the
//! assignment's effective due date (own date, else the protocol date).
//! Rows are sorted oldest date first, then by protocol id and reviewer id.

use chrono::NaiveDate;
use revtrack_core::{AsCalendarDate, Protocol, ProtocolRef, ReviewerAssignment, TemporalPolicy};
use serde::Serialize;

/// One pending assignment with its effective due date
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentRow {
    /// Protocol id
    pub protocol_id: String,
    /// Protocol display name
    pub protocol_name: String,
    /// Where the protocol is stored
    pub reference: ProtocolRef,
    /// Reviewer id
    pub reviewer_id: String,
    /// Reviewer display name
    pub reviewer_name: String,
    /// Form or document type under review
    pub document_type: Option<String>,
    /// Effective due date
    pub due_date: NaiveDate,
}

impl AssignmentRow {
    fn new(protocol: &Protocol, assignment: &ReviewerAssignment, due_date: NaiveDate) -> Self {
        Self {
            protocol_id: protocol.id.clone(),
            protocol_name: protocol.name.clone(),
            reference: protocol.reference(),
            reviewer_id: assignment.reviewer_id.clone(),
            reviewer_name: assignment.reviewer_name.clone(),
            document_type: assignment
                .document_type
                .clone()
                .or_else(|| protocol.document_type.clone()),
            due_date,
        }
    }

    fn sort_key(&self) -> (NaiveDate, &str, &str) {
        (self.due_date, &self.protocol_id, &self.reviewer_id)
    }
}

fn pending_rows(protocols: &[Protocol], keep: impl Fn(NaiveDate) -> bool) -> Vec<AssignmentRow> {
    let mut rows: Vec<AssignmentRow> = protocols
        .iter()
        .flat_map(|protocol| {
            protocol.pending_assignments().filter_map(move |assignment| {
                protocol
                    .effective_due_date(assignment)
                    .map(|due| (protocol, assignment, due))
            })
        })
        .filter(|&(_, _, due)| keep(due))
        .map(|(protocol, assignment, due)| AssignmentRow::new(protocol, assignment, due))
        .collect();
    rows.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    rows
}

/// Every pending assignment whose effective due date has passed
#[must_use]
pub fn overdue_assignments(protocols: &[Protocol], now: impl AsCalendarDate) -> Vec<AssignmentRow> {
    let today = now.calendar_date();
    let policy = TemporalPolicy::default();
    pending_rows(protocols, move |due| policy.is_overdue(Some(due), today))
}

/// Every pending assignment whose effective due date falls in the due-soon window
#[must_use]
pub fn due_soon_assignments(
    protocols: &[Protocol],
    now: impl AsCalendarDate,
    policy: &TemporalPolicy,
) -> Vec<AssignmentRow> {
    let today = now.calendar_date();
    let policy = *policy;
    pending_rows(protocols, move |due| policy.is_due_soon(Some(due), today))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Vec<Protocol> {
        vec![
            Protocol::new("P-2", "Cardio trial")
                .with_due_date(ymd(2024, 4, 1))
                .with_assignment(ReviewerAssignment::new("R2", "Dr. Lee"))
                .with_assignment(
                    ReviewerAssignment::new("R1", "Dr. Yu")
                        .with_due_date(ymd(2024, 3, 1))
                        .completed_on(ymd(2024, 3, 2)),
                ),
            Protocol::new("P-1", "Sleep study")
                .with_assignment(
                    ReviewerAssignment::new("R3", "Dr. Kim")
                        .with_document_type("ICF")
                        .with_due_date(ymd(2024, 4, 1)),
                )
                .with_assignment(ReviewerAssignment::new("R4", "Dr. Fermin").with_due_date(ymd(2024, 5, 3))),
            Protocol::new("P-3", "Undated").with_assignment(ReviewerAssignment::new("R5", "Dr. Ode")),
        ]
    }

    #[test]
    fn overdue_rows_use_effective_dates_and_skip_completed() {
        let rows = overdue_assignments(&sample(), ymd(2024, 5, 1));
        let keys: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.protocol_id.as_str(), r.reviewer_id.as_str()))
            .collect();
        assert_eq!(keys, vec![("P-1", "R3"), ("P-2", "R2")]);
        assert_eq!(rows[0].document_type.as_deref(), Some("ICF"));
        assert_eq!(rows[1].due_date, ymd(2024, 4, 1));
    }

    #[test]
    fn due_soon_window_is_inclusive() {
        let policy = TemporalPolicy::default();
        let rows = due_soon_assignments(&sample(), ymd(2024, 4, 30), &policy);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].reviewer_id, "R4");

        let rows = due_soon_assignments(&sample(), ymd(2024, 4, 29), &policy);
        assert!(rows.is_empty());
    }

    #[test]
    fn overdue_and_due_soon_never_share_a_row() {
        let protocols = sample();
        for offset in 0..90 {
            let today = ymd(2024, 2, 1) + chrono::Duration::days(offset);
            let overdue = overdue_assignments(&protocols, today);
            let soon = due_soon_assignments(&protocols, today, &TemporalPolicy::default());
            assert!(overdue.iter().all(|row| !soon.contains(row)));
        }
    }
}
