//! Testing utilities for the revtrack workspace
//!
//! Shared fixtures, seeded stores and a failure-injecting store wrapper.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::NaiveDate;
use revtrack_core::ProtocolRef;
use revtrack_store::{
    DocumentStore, Enumeration, InMemoryStore, RawRecord, RecordMutator, ReviewError, StoreError,
    StoredRecord,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn raw(value: Value) -> RawRecord {
    RawRecord::from_value(value).expect("fixture must be a JSON object")
}

/// Current-shape reviewer entry
pub fn reviewer_entry(id: &str, name: &str, status: &str, due: Option<&str>) -> Value {
    let mut entry = json!({ "id": id, "name": name, "status": status });
    if let Some(due) = due {
        entry["due_date"] = json!(due);
    }
    entry
}

/// Current-shape record holding the given reviewer entries
pub fn current_record(name: &str, reviewers: Vec<Value>) -> RawRecord {
    raw(json!({ "protocol_name": name, "reviewers": reviewers }))
}

/// Legacy single-reviewer record
pub fn legacy_record(reviewer: &str, status: &str, due: &str) -> RawRecord {
    raw(json!({ "reviewer": reviewer, "status": status, "due_date": due }))
}

/// Store with one protocol in each layout and one mixed-status protocol
///
/// - `P-LEGACY` (flat): legacy shape, DRAPL-001, due 2024-03-01, in progress
/// - `2024-05/week-2/P-NESTED`: R1 completed, R2 in progress due 2024-05-20
/// - `P-DONE` (flat): one completed review
pub fn seeded_store() -> InMemoryStore {
    InMemoryStore::new()
        .with_record(
            ProtocolRef::flat("P-LEGACY"),
            legacy_record("DRAPL-001", "In Progress", "2024-03-01"),
        )
        .with_record(
            ProtocolRef::nested("2024-05", "week-2", "P-NESTED"),
            current_record(
                "Sleep study",
                vec![
                    json!({ "id": "R1", "name": "Dr. Ester Yu", "status": "Completed",
                            "due_date": "2024-05-10", "completed_at": "2024-05-08" }),
                    reviewer_entry("R2", "Dr. Rogelio Fermin", "In Progress", Some("2024-05-20")),
                ],
            ),
        )
        .with_record(
            ProtocolRef::flat("P-DONE"),
            current_record(
                "Cardio trial",
                vec![json!({ "id": "R1", "name": "Dr. Ester Yu", "status": "Completed",
                             "due_date": "2024-04-01", "completed_at": "2024-04-03" })],
            ),
        )
}

/// Which operations a [`FlakyStore`] fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Reads,
    Updates,
    Everything,
}

/// Store wrapper failing the next `n` matching calls with a transport error
#[derive(Debug)]
pub struct FlakyStore<S> {
    inner: S,
    fail_on: FailOn,
    remaining: AtomicUsize,
}

impl<S> FlakyStore<S> {
    pub fn new(inner: S, fail_on: FailOn, failures: usize) -> Self {
        Self {
            inner,
            fail_on,
            remaining: AtomicUsize::new(failures),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn remaining_failures(&self) -> usize {
        self.remaining.load(Ordering::SeqCst)
    }

    fn trip(&self, update: bool) -> Result<(), StoreError> {
        let applies = match self.fail_on {
            FailOn::Reads => !update,
            FailOn::Updates => update,
            FailOn::Everything => true,
        };
        if !applies {
            return Ok(());
        }
        let tripped = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if tripped {
            Err(StoreError::Transport("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for FlakyStore<S> {
    async fn enumerate_all(&self, scope: Enumeration) -> Result<Vec<StoredRecord>, StoreError> {
        self.trip(false)?;
        self.inner.enumerate_all(scope).await
    }

    async fn read_one(&self, reference: &ProtocolRef) -> Result<Option<RawRecord>, StoreError> {
        self.trip(false)?;
        self.inner.read_one(reference).await
    }

    async fn atomic_update(
        &self,
        reference: &ProtocolRef,
        mutator: &RecordMutator<'_>,
    ) -> Result<RawRecord, ReviewError> {
        self.trip(true)?;
        self.inner.atomic_update(reference, mutator).await
    }
}
