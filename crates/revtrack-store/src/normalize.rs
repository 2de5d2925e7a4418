//! Schema normalizer
//!
//! Converts a raw record (legacy or current shape, flat or hierarchical
//! layout) into one canonical [`Protocol`]. Individual malformed values
//! degrade to defaults ("no date", `InProgress`) instead of failing, so one
//! bad historical record never blocks a report over the rest.

use crate::raw::{fields, text_field, RawRecord, RawShape};
use revtrack_core::{
    normalize_date, Protocol, ProtocolRef, ProtocolStatus, RecordShape, ReviewStatus,
    ReviewerAssignment,
};
use serde_json::Value;

/// Normalize one raw record
///
/// `hint` is the storage path the record was enumerated from; it supplies
/// the protocol id and becomes the protocol's storage-path token.
#[must_use]
pub fn normalize(record: &RawRecord, hint: &ProtocolRef) -> Protocol {
    let id = hint.id().to_string();
    let name = record
        .first_text(&fields::DISPLAY_NAME)
        .map_or_else(|| id.clone(), str::to_string);

    let due_date = normalize_date(record.get(fields::DUE_DATE));
    let status = ProtocolStatus::parse(record.text(fields::STATUS));
    let document_type = record.text(fields::DOCUMENT_TYPE).map(str::to_string);
    let legacy_reviewer = record.text(fields::REVIEWER).map(str::to_string);

    let (assignments, shape) = match record.shape() {
        RawShape::Current { reviewers } => {
            (parse_assignments(reviewers).map(|(_, a)| a).collect(), RecordShape::Current)
        }
        RawShape::Legacy { reviewer } => {
            let assignment = legacy_assignment(record, reviewer);
            (vec![assignment], RecordShape::Legacy)
        }
        RawShape::Unassigned => {
            if record.get(fields::REVIEWERS).is_some_and(|v| !v.is_array()) {
                tracing::debug!(protocol = %hint, "ignoring non-list reviewers field");
            }
            let shape = if record.get(fields::REVIEWERS).is_some() {
                RecordShape::Current
            } else {
                RecordShape::Legacy
            };
            (Vec::new(), shape)
        }
    };

    Protocol {
        id,
        name,
        assignments,
        legacy_reviewer,
        document_type,
        due_date,
        status,
        created_at: normalize_date(record.get(fields::CREATED_AT)),
        release_period: record.first_text(&fields::RELEASE_PERIOD).map(str::to_string),
        storage_path: Some(hint.clone()),
        shape,
    }
}

/// Parse the entries of a `reviewers` list, keeping each entry's index
///
/// Entries that are neither maps nor non-blank strings are skipped.
pub fn parse_assignments(
    reviewers: &[Value],
) -> impl Iterator<Item = (usize, ReviewerAssignment)> + '_ {
    reviewers
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| parse_assignment(entry).map(|a| (idx, a)))
}

/// Parse one `reviewers` entry
#[must_use]
pub fn parse_assignment(entry: &Value) -> Option<ReviewerAssignment> {
    match entry {
        Value::Object(map) => {
            let id = text_field(map, fields::ID).or_else(|| text_field(map, fields::REVIEWER_ID));
            let name =
                text_field(map, fields::NAME).or_else(|| text_field(map, fields::REVIEWER_NAME));
            let (id, name) = match (id, name) {
                (Some(id), Some(name)) => (id, name),
                (Some(id), None) => (id, id),
                (None, Some(name)) => (name, name),
                (None, None) => ("", ""),
            };

            let status = ReviewStatus::parse(text_field(map, fields::STATUS));
            let completed_at = if status.is_completed() {
                normalize_date(map.get(fields::COMPLETED_AT))
            } else {
                None
            };

            Some(ReviewerAssignment {
                reviewer_id: id.to_string(),
                reviewer_name: name.to_string(),
                status,
                document_type: text_field(map, fields::DOCUMENT_TYPE)
                    .or_else(|| text_field(map, fields::FORM_TYPE))
                    .map(str::to_string),
                due_date: normalize_date(map.get(fields::DUE_DATE)),
                completed_at,
            })
        }
        Value::String(text) if !text.trim().is_empty() => {
            Some(ReviewerAssignment::new(text.trim(), text.trim()))
        }
        _ => None,
    }
}

/// Synthesize the single implicit assignment of a legacy record
#[must_use]
pub fn legacy_assignment(record: &RawRecord, reviewer: &str) -> ReviewerAssignment {
    let name = record.text(fields::REVIEWER_NAME).unwrap_or(reviewer);
    let status = ReviewStatus::parse(record.text(fields::STATUS));
    ReviewerAssignment {
        reviewer_id: reviewer.to_string(),
        reviewer_name: name.to_string(),
        status,
        document_type: record.text(fields::DOCUMENT_TYPE).map(str::to_string),
        due_date: normalize_date(record.get(fields::DUE_DATE)),
        completed_at: if status.is_completed() {
            normalize_date(record.get(fields::COMPLETED_AT))
        } else {
            None
        },
    }
}
