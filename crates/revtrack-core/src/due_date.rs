//! Representative due date
//!
//! Dashboards sort and badge each protocol by one date even though every
//! assignment may carry its own. Resolution, using effective due dates
//! (own date, else the protocol date):
//!
//! 1. no assignments: the protocol date
//! 2. everything completed: the latest date across all assignments
//! 3. otherwise, among pending assignments: the earliest date on or after today
//! 4. failing that: the latest past-due pending date
//! 5. no assignment yields a date at all: the protocol date

use crate::date::AsCalendarDate;
use crate::model::{Protocol, ReviewerAssignment};
use chrono::NaiveDate;

/// Resolve the single date a protocol is sorted and badged by
#[must_use]
pub fn resolve_representative_due_date(
    protocol: &Protocol,
    now: impl AsCalendarDate,
) -> Option<NaiveDate> {
    if protocol.assignments.is_empty() {
        return protocol.due_date;
    }

    let today = now.calendar_date();
    let effective = |a: &ReviewerAssignment| protocol.effective_due_date(a);

    let pending: Vec<NaiveDate> = protocol.pending_assignments().filter_map(effective).collect();

    let resolved = if protocol.pending_assignments().next().is_none() {
        protocol.assignments.iter().filter_map(effective).max()
    } else {
        pending
            .iter()
            .copied()
            .filter(|d| *d >= today)
            .min()
            .or_else(|| pending.iter().copied().filter(|d| *d < today).max())
    };

    resolved.or(protocol.due_date)
}
