//! Atomic assignment updates
//!
//! Reassignment and review submission/correction both run as one
//! read-modify-write inside [`DocumentStore::atomic_update`]: the changed
//! assignment and the recomputed aggregate status are written together, or
//! nothing is written. Updates keep the record's existing shape so the
//! normalizer can still read it.

use crate::error::ReviewError;
use crate::normalize::{legacy_assignment, normalize, parse_assignment, parse_assignments};
use crate::raw::{fields, RawRecord, RawShape};
use crate::store::DocumentStore;
use chrono::NaiveDate;
use revtrack_core::identity::{assignment_match, best_match, short_name_risk};
use revtrack_core::{
    aggregate_assignments, canonical_date_string, MatchKind, Protocol, ProtocolRef,
    ProtocolStatus, ReviewStatus, ReviewerAssignment, ReviewerIdentity,
};
use serde_json::{Map, Value};

/// Swap the reviewer on one assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    /// Reviewer currently assigned
    pub from: ReviewerIdentity,
    /// Reviewer taking over
    pub to: ReviewerIdentity,
}

impl Reassignment {
    /// Create a reassignment request
    #[inline]
    #[must_use]
    pub fn new(from: ReviewerIdentity, to: ReviewerIdentity) -> Self {
        Self { from, to }
    }
}

/// Flip one assignment between `InProgress` and `Completed`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// Reviewer whose assignment changes
    pub reviewer: ReviewerIdentity,
    /// New status
    pub status: ReviewStatus,
    /// Completion date recorded when `status` is `Completed`
    pub completed_on: Option<NaiveDate>,
}

impl StatusChange {
    /// Review submitted
    #[inline]
    #[must_use]
    pub fn complete(reviewer: ReviewerIdentity, on: NaiveDate) -> Self {
        Self {
            reviewer,
            status: ReviewStatus::Completed,
            completed_on: Some(on),
        }
    }

    /// Review reverted for correction
    #[inline]
    #[must_use]
    pub fn reopen(reviewer: ReviewerIdentity) -> Self {
        Self {
            reviewer,
            status: ReviewStatus::InProgress,
            completed_on: None,
        }
    }
}

/// The assignment a change applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    /// Index into the raw `reviewers` list
    Entry(usize),
    /// The implicit assignment of a legacy record
    Legacy,
}

fn flag_fuzzy_match(
    reference: &ProtocolRef,
    assignment: &ReviewerAssignment,
    candidate: &ReviewerIdentity,
    kind: MatchKind,
    short_name_len: usize,
) {
    if !kind.is_fuzzy() {
        return;
    }
    if short_name_risk(kind, &assignment.reviewer_name, &candidate.name, short_name_len) {
        tracing::warn!(
            protocol = %reference,
            assigned = %assignment.identity(),
            candidate = %candidate,
            ?kind,
            "reviewer matched on a short name; verify this is the same person"
        );
    } else {
        tracing::warn!(
            protocol = %reference,
            assigned = %assignment.identity(),
            candidate = %candidate,
            ?kind,
            "reviewer matched by name substring"
        );
    }
}

fn locate(
    record: &RawRecord,
    reference: &ProtocolRef,
    who: &ReviewerIdentity,
    short_name_len: usize,
) -> Result<Target, ReviewError> {
    let not_found = || ReviewError::AssignmentNotFound {
        reference: reference.clone(),
        reviewer: who.to_string(),
    };

    match record.shape() {
        RawShape::Current { reviewers } => {
            let (indices, assignments): (Vec<usize>, Vec<ReviewerAssignment>) =
                parse_assignments(reviewers).unzip();
            let (pos, kind) = best_match(&assignments, who).ok_or_else(not_found)?;
            flag_fuzzy_match(reference, &assignments[pos], who, kind, short_name_len);
            Ok(Target::Entry(indices[pos]))
        }
        RawShape::Legacy { reviewer } => {
            let assignment = legacy_assignment(record, reviewer);
            let kind = assignment_match(&assignment, who).ok_or_else(not_found)?;
            flag_fuzzy_match(reference, &assignment, who, kind, short_name_len);
            Ok(Target::Legacy)
        }
        RawShape::Unassigned => Err(not_found()),
    }
}

/// Write `value` under every alias already present, or under the first alias
fn set_aliased(map: &mut Map<String, Value>, aliases: &[&str], value: &str) {
    let mut wrote = false;
    for key in aliases {
        if map.contains_key(*key) {
            map.insert((*key).to_string(), Value::from(value));
            wrote = true;
        }
    }
    if !wrote {
        if let Some(first) = aliases.first() {
            map.insert((*first).to_string(), Value::from(value));
        }
    }
}

/// Map form of a `reviewers` entry, promoting bare-string entries
fn into_entry_map(entry: Value) -> Map<String, Value> {
    match entry {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            if let Some(a) = parse_assignment(&other) {
                map.insert(fields::ID.to_string(), Value::from(a.reviewer_id));
                map.insert(fields::NAME.to_string(), Value::from(a.reviewer_name));
            }
            map
        }
    }
}

fn write_status(map: &mut Map<String, Value>, status: ReviewStatus, completed_on: Option<NaiveDate>) {
    map.insert(fields::STATUS.to_string(), Value::from(status.as_str()));
    match (status, completed_on) {
        (ReviewStatus::Completed, Some(day)) => {
            map.insert(
                fields::COMPLETED_AT.to_string(),
                Value::from(canonical_date_string(day)),
            );
        }
        _ => {
            map.remove(fields::COMPLETED_AT);
        }
    }
}

/// Recompute and store the aggregate status of a current-shape record
fn write_aggregate(record: &mut RawRecord) -> ProtocolStatus {
    let stored = ProtocolStatus::parse(record.text(fields::STATUS));
    let assignments: Vec<ReviewerAssignment> = match record.get(fields::REVIEWERS) {
        Some(Value::Array(list)) => parse_assignments(list).map(|(_, a)| a).collect(),
        _ => Vec::new(),
    };
    let aggregate = aggregate_assignments(&assignments, stored);
    record.set(fields::STATUS, aggregate.as_str());
    aggregate
}

fn edit_entry(
    record: &RawRecord,
    reference: &ProtocolRef,
    index: usize,
    edit: impl FnOnce(&mut Map<String, Value>),
) -> Result<RawRecord, ReviewError> {
    let mut updated = record.clone();
    let entry = updated
        .reviewers_mut()
        .and_then(|list| list.get_mut(index))
        .ok_or_else(|| ReviewError::InvalidRecord {
            reference: reference.clone(),
            reason: format!("reviewers entry {index} disappeared during update"),
        })?;
    let mut map = into_entry_map(std::mem::take(entry));
    edit(&mut map);
    *entry = Value::Object(map);
    write_aggregate(&mut updated);
    Ok(updated)
}

/// Pure reassignment of a raw record
///
/// # Errors
/// `ReviewError::AssignmentNotFound` when no assignment matches `change.from`
pub fn apply_reassignment(
    record: &RawRecord,
    reference: &ProtocolRef,
    change: &Reassignment,
    short_name_len: usize,
) -> Result<RawRecord, ReviewError> {
    match locate(record, reference, &change.from, short_name_len)? {
        Target::Entry(index) => edit_entry(record, reference, index, |map| {
            set_aliased(map, &[fields::ID, fields::REVIEWER_ID], &change.to.id);
            set_aliased(map, &[fields::NAME, fields::REVIEWER_NAME], &change.to.name);
            write_status(map, ReviewStatus::InProgress, None);
        }),
        Target::Legacy => {
            let mut updated = record.clone();
            updated.set(fields::REVIEWER, change.to.id.as_str());
            if updated.get(fields::REVIEWER_NAME).is_some() {
                updated.set(fields::REVIEWER_NAME, change.to.name.as_str());
            }
            updated.set(fields::STATUS, ProtocolStatus::InProgress.as_str());
            updated.remove(fields::COMPLETED_AT);
            Ok(updated)
        }
    }
}

/// Pure status change of a raw record
///
/// # Errors
/// `ReviewError::AssignmentNotFound` when no assignment matches `change.reviewer`
pub fn apply_status_change(
    record: &RawRecord,
    reference: &ProtocolRef,
    change: &StatusChange,
    short_name_len: usize,
) -> Result<RawRecord, ReviewError> {
    match locate(record, reference, &change.reviewer, short_name_len)? {
        Target::Entry(index) => edit_entry(record, reference, index, |map| {
            write_status(map, change.status, change.completed_on);
        }),
        Target::Legacy => {
            let mut updated = record.clone();
            let aggregate = if change.status.is_completed() {
                ProtocolStatus::Completed
            } else {
                ProtocolStatus::InProgress
            };
            updated.set(fields::STATUS, aggregate.as_str());
            match (change.status, change.completed_on) {
                (ReviewStatus::Completed, Some(day)) => {
                    updated.set(fields::COMPLETED_AT, canonical_date_string(day));
                }
                _ => {
                    updated.remove(fields::COMPLETED_AT);
                }
            }
            Ok(updated)
        }
    }
}

/// Reassign one assignment atomically and return the normalized result
///
/// # Errors
/// - `ReviewError::RecordNotFound` for a missing protocol
/// - `ReviewError::AssignmentNotFound` when `change.from` is not assigned
/// - `ReviewError::Store` for transport failures
pub async fn reassign<S: DocumentStore + ?Sized>(
    store: &S,
    reference: &ProtocolRef,
    change: &Reassignment,
    short_name_len: usize,
) -> Result<Protocol, ReviewError> {
    let mutator = |record: &RawRecord| apply_reassignment(record, reference, change, short_name_len);
    let updated = store.atomic_update(reference, &mutator).await?;
    let protocol = normalize(&updated, reference);
    tracing::info!(
        protocol = %reference,
        from = %change.from,
        to = %change.to,
        status = %revtrack_core::aggregate_status(&protocol),
        "reassigned reviewer"
    );
    Ok(protocol)
}

/// Apply a status change atomically and return the normalized result
///
/// # Errors
/// As [`reassign`]
pub async fn set_review_status<S: DocumentStore + ?Sized>(
    store: &S,
    reference: &ProtocolRef,
    change: &StatusChange,
    short_name_len: usize,
) -> Result<Protocol, ReviewError> {
    let mutator = |record: &RawRecord| apply_status_change(record, reference, change, short_name_len);
    let updated = store.atomic_update(reference, &mutator).await?;
    let protocol = normalize(&updated, reference);
    tracing::info!(
        protocol = %reference,
        reviewer = %change.reviewer,
        review_status = %change.status,
        status = %revtrack_core::aggregate_status(&protocol),
        "updated review status"
    );
    Ok(protocol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        RawRecord::from_value(value).unwrap()
    }

    fn reference() -> ProtocolRef {
        ProtocolRef::flat("P-1")
    }

    #[test]
    fn reassign_preserves_type_and_due_date() {
        let raw = record(json!({
            "status": "Partially Completed",
            "reviewers": [
                { "id": "R1", "name": "Dr. Yu", "status": "Completed",
                  "completed_at": "2024-01-02", "document_type": "ICF", "due_date": "2024-01-01" },
                { "id": "R2", "name": "Dr. Lee", "status": "Completed", "completed_at": "2024-01-03" }
            ]
        }));
        let change = Reassignment::new(
            ReviewerIdentity::from_id("R1"),
            ReviewerIdentity::new("R3", "Dr. Fermin"),
        );
        let updated = apply_reassignment(&raw, &reference(), &change, 4).unwrap();

        assert_eq!(
            updated.get("reviewers").unwrap()[0],
            json!({ "id": "R3", "name": "Dr. Fermin", "status": "In Progress",
                    "document_type": "ICF", "due_date": "2024-01-01" })
        );
        assert_eq!(updated.text("status"), Some("Partially Completed"));
    }

    #[test]
    fn reassign_writes_alternate_key_names() {
        let raw = record(json!({
            "reviewers": [{ "reviewer_id": "R1", "reviewer_name": "Dr. Yu" }]
        }));
        let change = Reassignment::new(
            ReviewerIdentity::new("R1", "Dr. Yu"),
            ReviewerIdentity::new("R3", "Dr. Fermin"),
        );
        let updated = apply_reassignment(&raw, &reference(), &change, 4).unwrap();
        let entry = &updated.get("reviewers").unwrap()[0];
        assert_eq!(entry["reviewer_id"], json!("R3"));
        assert_eq!(entry["reviewer_name"], json!("Dr. Fermin"));
        assert!(entry.get("id").is_none());
    }

    #[test]
    fn reassign_legacy_rewrites_single_field() {
        let raw = record(json!({
            "reviewer": "DRAPL-001",
            "status": "Completed",
            "completed_at": "2024-02-01",
            "due_date": "2024-03-01"
        }));
        let change = Reassignment::new(
            ReviewerIdentity::from_id("DRAPL-001"),
            ReviewerIdentity::new("DRAPL-002", "Dr. Fermin"),
        );
        let updated = apply_reassignment(&raw, &reference(), &change, 4).unwrap();
        assert_eq!(updated.text("reviewer"), Some("DRAPL-002"));
        assert_eq!(updated.text("status"), Some("In Progress"));
        assert!(updated.get("completed_at").is_none());
        assert_eq!(updated.text("due_date"), Some("2024-03-01"));
        assert!(updated.get("reviewers").is_none());
    }

    #[test]
    fn unmatched_reviewer_is_not_found() {
        let raw = record(json!({ "reviewers": [{ "id": "R1", "name": "Dr. Ester Yu" }] }));
        let change = Reassignment::new(
            ReviewerIdentity::new("R9", "Dr. Rogelio Fermin"),
            ReviewerIdentity::new("R3", "Dr. Lee"),
        );
        let err = apply_reassignment(&raw, &reference(), &change, 4).unwrap_err();
        assert!(matches!(err, ReviewError::AssignmentNotFound { .. }));

        let empty = record(json!({ "reviewers": [] }));
        let err = apply_reassignment(&empty, &reference(), &change, 4).unwrap_err();
        assert!(matches!(err, ReviewError::AssignmentNotFound { .. }));
    }

    #[test]
    fn completing_last_assignment_completes_protocol() {
        let raw = record(json!({
            "status": "Partially Completed",
            "reviewers": [
                { "id": "R1", "status": "Completed", "completed_at": "2024-01-02" },
                { "id": "R2", "status": "In Progress" }
            ]
        }));
        let day = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        let change = StatusChange::complete(ReviewerIdentity::from_id("R2"), day);
        let updated = apply_status_change(&raw, &reference(), &change, 4).unwrap();
        assert_eq!(updated.text("status"), Some("Completed"));
        assert_eq!(updated.get("reviewers").unwrap()[1]["completed_at"], json!("2024-01-09"));
    }

    #[test]
    fn reopening_clears_completion_and_demotes_status() {
        let raw = record(json!({
            "status": "Completed",
            "reviewers": [{ "id": "R1", "status": "Completed", "completed_at": "2024-01-02" }]
        }));
        let change = StatusChange::reopen(ReviewerIdentity::from_id("R1"));
        let updated = apply_status_change(&raw, &reference(), &change, 4).unwrap();
        assert_eq!(updated.text("status"), Some("In Progress"));
        assert!(updated.get("reviewers").unwrap()[0].get("completed_at").is_none());
    }

    #[test]
    fn string_entries_are_promoted_on_write() {
        let raw = record(json!({ "reviewers": ["Dr. Yu", "Dr. Lee"] }));
        let change = Reassignment::new(
            ReviewerIdentity::from_id("Dr. Lee"),
            ReviewerIdentity::new("R7", "Dr. Kim"),
        );
        let updated = apply_reassignment(&raw, &reference(), &change, 4).unwrap();
        let list = updated.get("reviewers").unwrap();
        assert_eq!(list[0], json!("Dr. Yu"));
        assert_eq!(list[1], json!({ "id": "R7", "name": "Dr. Kim", "status": "In Progress" }));
    }

    #[test]
    fn original_record_is_untouched() {
        let raw = record(json!({ "reviewers": [{ "id": "R1", "status": "Completed" }] }));
        let snapshot = raw.clone();
        let change = StatusChange::reopen(ReviewerIdentity::from_id("R1"));
        let _ = apply_status_change(&raw, &reference(), &change, 4).unwrap();
        assert_eq!(raw, snapshot);
    }
}
