//! Document-store contract
//!
//! The engine needs exactly three operations from a backing store:
//! - enumerate every protocol record, in either layout
//! - read one record by storage path
//! - run an isolated read-modify-write on one record
//!
//! Retry/backoff inside `atomic_update` is the store's business; the engine
//! never retries.

use crate::error::{ReviewError, StoreError};
use crate::raw::RawRecord;
use async_trait::async_trait;
use revtrack_core::ProtocolRef;

/// Read-modify-write step run inside [`DocumentStore::atomic_update`]
///
/// Receives the current record and returns its replacement. An `Err`
/// aborts the update with nothing written. Stores may invoke it more than
/// once when they retry internally, so it must be free of side effects.
pub type RecordMutator<'a> = dyn Fn(&RawRecord) -> Result<RawRecord, ReviewError> + Send + Sync + 'a;

/// Which storage layouts an enumeration walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Enumeration {
    /// Flat and month/week layouts together
    #[default]
    All,
    /// Flat collection only
    Flat,
    /// Month/week hierarchy only, flattened
    Nested,
}

impl Enumeration {
    /// Whether a reference falls inside this enumeration
    #[inline]
    #[must_use]
    pub fn includes(&self, reference: &ProtocolRef) -> bool {
        match self {
            Self::All => true,
            Self::Flat => !reference.is_nested(),
            Self::Nested => reference.is_nested(),
        }
    }
}

/// A raw record together with the path it was enumerated from
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// Storage path
    pub reference: ProtocolRef,
    /// Field map
    pub record: RawRecord,
}

/// Abstract document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every record in the requested layouts
    async fn enumerate_all(&self, scope: Enumeration) -> Result<Vec<StoredRecord>, StoreError>;

    /// One record, or `None` when nothing lives at the path
    async fn read_one(&self, reference: &ProtocolRef) -> Result<Option<RawRecord>, StoreError>;

    /// Isolated read-modify-write of one record
    ///
    /// # Errors
    /// - `ReviewError::RecordNotFound` when nothing lives at the path
    /// - any error returned by `mutator`, with nothing written
    /// - `ReviewError::Store` for transport failures
    async fn atomic_update(
        &self,
        reference: &ProtocolRef,
        mutator: &RecordMutator<'_>,
    ) -> Result<RawRecord, ReviewError>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<S> {
    async fn enumerate_all(&self, scope: Enumeration) -> Result<Vec<StoredRecord>, StoreError> {
        (**self).enumerate_all(scope).await
    }

    async fn read_one(&self, reference: &ProtocolRef) -> Result<Option<RawRecord>, StoreError> {
        (**self).read_one(reference).await
    }

    async fn atomic_update(
        &self,
        reference: &ProtocolRef,
        mutator: &RecordMutator<'_>,
    ) -> Result<RawRecord, ReviewError> {
        (**self).atomic_update(reference, mutator).await
    }
}
