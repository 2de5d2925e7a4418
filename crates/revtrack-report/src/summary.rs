//! Per-protocol summary badge

use chrono::NaiveDate;
use revtrack_core::{
    aggregate_status, resolve_representative_due_date, AsCalendarDate, Protocol, ProtocolRef,
    ProtocolStatus, TemporalPolicy, Urgency,
};
use serde::Serialize;

/// What a dashboard row shows for one protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtocolSummary {
    /// Protocol id
    pub protocol_id: String,
    /// Protocol display name
    pub protocol_name: String,
    /// Where the protocol is stored
    pub reference: ProtocolRef,
    /// Aggregate status
    pub status: ProtocolStatus,
    /// Date the protocol is sorted and badged by
    pub due_date: Option<NaiveDate>,
    /// Badge for `due_date`
    pub urgency: Urgency,
    /// Number of assignments
    pub assignments: usize,
    /// Number of completed assignments
    pub completed: usize,
}

impl ProtocolSummary {
    /// Summarize one protocol as of `now`
    #[must_use]
    pub fn build(protocol: &Protocol, now: impl AsCalendarDate, policy: &TemporalPolicy) -> Self {
        let today = now.calendar_date();
        let status = aggregate_status(protocol);
        let due_date = resolve_representative_due_date(protocol, today);
        Self {
            protocol_id: protocol.id.clone(),
            protocol_name: protocol.name.clone(),
            reference: protocol.reference(),
            status,
            due_date,
            urgency: policy.urgency(due_date, status.is_completed(), today),
            assignments: protocol.assignments.len(),
            completed: protocol.assignments.iter().filter(|a| a.is_completed()).count(),
        }
    }
}

/// Summaries for every protocol, most urgent first
///
/// Within one urgency, earlier dates come first and undated rows last.
#[must_use]
pub fn summarize_all(
    protocols: &[Protocol],
    now: impl AsCalendarDate,
    policy: &TemporalPolicy,
) -> Vec<ProtocolSummary> {
    let today = now.calendar_date();
    let mut summaries: Vec<ProtocolSummary> = protocols
        .iter()
        .map(|p| ProtocolSummary::build(p, today, policy))
        .collect();
    summaries.sort_by(|a, b| {
        a.urgency
            .cmp(&b.urgency)
            .then_with(|| (a.due_date.is_none(), a.due_date).cmp(&(b.due_date.is_none(), b.due_date)))
            .then_with(|| a.protocol_id.cmp(&b.protocol_id))
    });
    summaries
}
