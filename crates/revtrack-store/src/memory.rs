//! In-memory document store
//!
//! Backs tests and the CLI. Records live in a [`DashMap`] keyed by storage
//! path; `atomic_update` runs the mutator while holding the entry's shard
//! write lock, so concurrent updates of one record serialize and readers
//! only ever see a fully committed record.
//!
//! The store loads from and exports to a JSON document:
//!
//! ```json
//! {
//!   "protocols": { "P-1": { "reviewer": "DRAPL-001" } },
//!   "protocols_by_month": { "2024-05": { "week-1": { "P-2": { "reviewers": [] } } } }
//! }
//! ```

use crate::error::{ReviewError, StoreError};
use crate::raw::RawRecord;
use crate::store::{DocumentStore, Enumeration, RecordMutator, StoredRecord};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use revtrack_core::ProtocolRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;

/// Month → week → id → record
pub type NestedRecords = BTreeMap<String, BTreeMap<String, BTreeMap<String, RawRecord>>>;

/// Serialized form of the whole store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreExport {
    /// Flat layout
    #[serde(default)]
    pub protocols: BTreeMap<String, RawRecord>,
    /// Month/week layout
    #[serde(default)]
    pub protocols_by_month: NestedRecords,
}

/// Commits retained by [`InMemoryStore::commits`]
pub const JOURNAL_TAIL: usize = 256;

/// One committed update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Monotonic sequence number, starting at 1
    pub sequence: u64,
    /// Record that was written
    pub reference: ProtocolRef,
}

/// Commit counter plus a bounded tail of recent commits
#[derive(Debug, Default)]
struct Journal {
    committed: u64,
    recent: VecDeque<Commit>,
}

impl Journal {
    fn record(&mut self, reference: &ProtocolRef) -> u64 {
        self.committed += 1;
        if self.recent.len() == JOURNAL_TAIL {
            self.recent.pop_front();
        }
        self.recent.push_back(Commit {
            sequence: self.committed,
            reference: reference.clone(),
        });
        self.committed
    }
}

/// Thread-safe in-memory store
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: DashMap<ProtocolRef, RawRecord>,
    journal: Mutex<Journal>,
}

impl InMemoryStore {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record outside any transaction
    pub fn insert(&self, reference: ProtocolRef, record: RawRecord) -> Option<RawRecord> {
        self.records.insert(reference, record)
    }

    /// With a record inserted
    #[must_use]
    pub fn with_record(self, reference: ProtocolRef, record: RawRecord) -> Self {
        self.insert(reference, record);
        self
    }

    /// Number of stored records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check for an empty store
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot of one record
    #[must_use]
    pub fn get(&self, reference: &ProtocolRef) -> Option<RawRecord> {
        self.records.get(reference).map(|r| r.value().clone())
    }

    /// The last [`JOURNAL_TAIL`] committed updates, oldest first
    #[must_use]
    pub fn commits(&self) -> Vec<Commit> {
        self.journal.lock().recent.iter().cloned().collect()
    }

    /// Number of committed updates since the store was created
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.journal.lock().committed as usize
    }

    /// Build a store from an export document
    #[must_use]
    pub fn from_export(export: StoreExport) -> Self {
        let store = Self::new();
        for (id, record) in export.protocols {
            store.insert(ProtocolRef::flat(id), record);
        }
        for (month, weeks) in export.protocols_by_month {
            for (week, records) in weeks {
                for (id, record) in records {
                    store.insert(ProtocolRef::nested(month.clone(), week.clone(), id), record);
                }
            }
        }
        store
    }

    /// Export every record in both layouts
    #[must_use]
    pub fn export(&self) -> StoreExport {
        let mut export = StoreExport::default();
        for entry in &self.records {
            let record = entry.value().clone();
            match entry.key() {
                ProtocolRef::Flat { id } => {
                    export.protocols.insert(id.clone(), record);
                }
                ProtocolRef::Nested { month, week, id } => {
                    export
                        .protocols_by_month
                        .entry(month.clone())
                        .or_default()
                        .entry(week.clone())
                        .or_default()
                        .insert(id.clone(), record);
                }
            }
        }
        export
    }

    /// Load from a JSON export file
    ///
    /// # Errors
    /// `StoreError::Io` or `StoreError::Serialization`
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let export: StoreExport = serde_json::from_str(&text)?;
        let store = Self::from_export(export);
        tracing::info!(
            path = %path.as_ref().display(),
            records = store.len(),
            "loaded protocol export"
        );
        Ok(store)
    }

    /// Write a JSON export file
    ///
    /// # Errors
    /// `StoreError::Io` or `StoreError::Serialization`
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(&self.export())?;
        std::fs::write(path.as_ref(), text)?;
        tracing::debug!(path = %path.as_ref().display(), "wrote protocol export");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn enumerate_all(&self, scope: Enumeration) -> Result<Vec<StoredRecord>, StoreError> {
        let mut out: Vec<StoredRecord> = self
            .records
            .iter()
            .filter(|entry| scope.includes(entry.key()))
            .map(|entry| StoredRecord {
                reference: entry.key().clone(),
                record: entry.value().clone(),
            })
            .collect();
        out.sort_by(|a, b| a.reference.cmp(&b.reference));
        Ok(out)
    }

    async fn read_one(&self, reference: &ProtocolRef) -> Result<Option<RawRecord>, StoreError> {
        Ok(self.get(reference))
    }

    async fn atomic_update(
        &self,
        reference: &ProtocolRef,
        mutator: &RecordMutator<'_>,
    ) -> Result<RawRecord, ReviewError> {
        // Shard write lock held until the replacement is in place
        let mut entry = self
            .records
            .get_mut(reference)
            .ok_or_else(|| ReviewError::RecordNotFound {
                reference: reference.clone(),
            })?;

        let updated = mutator(entry.value())?;
        *entry.value_mut() = updated.clone();

        let sequence = self.journal.lock().record(reference);
        drop(entry);

        tracing::debug!(protocol = %reference, sequence, "committed update");
        Ok(updated)
    }
}
