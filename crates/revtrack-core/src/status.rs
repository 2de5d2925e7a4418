//! Aggregate protocol status
//!
//! Pure function of the assignment statuses. Recompute after every
//! assignment mutation; never cache.

use crate::model::{Protocol, ProtocolStatus, ReviewStatus, ReviewerAssignment};

/// Aggregate over an assignment set, with the stored status as the
/// zero-assignment fallback
#[must_use]
pub fn aggregate_assignments(
    assignments: &[ReviewerAssignment],
    stored: ProtocolStatus,
) -> ProtocolStatus {
    aggregate_statuses(assignments.iter().map(|a| a.status), stored)
}

/// Aggregate over bare statuses
#[must_use]
pub fn aggregate_statuses(
    statuses: impl IntoIterator<Item = ReviewStatus>,
    stored: ProtocolStatus,
) -> ProtocolStatus {
    let (total, completed) = statuses
        .into_iter()
        .fold((0usize, 0usize), |(total, done), status| {
            (total + 1, done + usize::from(status.is_completed()))
        });

    if total == 0 {
        return if stored.is_completed() {
            ProtocolStatus::Completed
        } else {
            ProtocolStatus::InProgress
        };
    }

    if completed == total {
        ProtocolStatus::Completed
    } else if completed > 0 {
        ProtocolStatus::PartiallyCompleted
    } else {
        ProtocolStatus::InProgress
    }
}

/// Aggregate status of a protocol
#[inline]
#[must_use]
pub fn aggregate_status(protocol: &Protocol) -> ProtocolStatus {
    aggregate_assignments(&protocol.assignments, protocol.status)
}
