//! Protocol repository
//!
//! Stateless facade over a [`DocumentStore`]: every read returns freshly
//! normalized [`Protocol`] values and every write goes through the
//! transactor. Holds no cache.

use crate::error::ReviewError;
use crate::normalize::normalize;
use crate::store::{DocumentStore, Enumeration};
use crate::transactor::{self, Reassignment, StatusChange};
use futures::future::join_all;
use revtrack_core::{EngineConfig, Protocol, ProtocolRef};
use std::collections::HashMap;

/// Normalized view over a document store
#[derive(Debug, Clone)]
pub struct ProtocolRepository<S> {
    store: S,
    config: EngineConfig,
}

impl<S: DocumentStore> ProtocolRepository<S> {
    /// Create a repository with default configuration
    #[inline]
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Create a repository with explicit configuration
    #[inline]
    #[must_use]
    pub fn with_config(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Backing store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Normalize every protocol in both layouts
    ///
    /// When one id lives in both layouts the hierarchical copy wins.
    ///
    /// # Errors
    /// `ReviewError::Store` for transport failures
    pub async fn load_all(&self) -> Result<Vec<Protocol>, ReviewError> {
        let records = self.store.enumerate_all(Enumeration::All).await?;
        let total = records.len();

        let mut by_id: HashMap<String, usize> = HashMap::with_capacity(total);
        let mut protocols: Vec<Protocol> = Vec::with_capacity(total);
        for stored in records {
            let protocol = normalize(&stored.record, &stored.reference);
            match by_id.get(&protocol.id) {
                Some(&idx) => {
                    let existing_nested = protocols[idx]
                        .storage_path
                        .as_ref()
                        .is_some_and(ProtocolRef::is_nested);
                    let replace = !existing_nested && stored.reference.is_nested();
                    let (kept, dropped) = if replace {
                        (stored.reference.clone(), protocols[idx].reference())
                    } else {
                        (protocols[idx].reference(), stored.reference.clone())
                    };
                    tracing::warn!(
                        protocol = %protocol.id,
                        %kept,
                        %dropped,
                        "protocol stored at more than one path"
                    );
                    if replace {
                        protocols[idx] = protocol;
                    }
                }
                None => {
                    by_id.insert(protocol.id.clone(), protocols.len());
                    protocols.push(protocol);
                }
            }
        }

        tracing::info!(records = total, protocols = protocols.len(), "loaded protocols");
        Ok(protocols)
    }

    /// Read and normalize one protocol
    ///
    /// # Errors
    /// - `ReviewError::RecordNotFound` when nothing lives at the path
    /// - `ReviewError::Store` for transport failures
    pub async fn get(&self, reference: &ProtocolRef) -> Result<Protocol, ReviewError> {
        let record = self
            .store
            .read_one(reference)
            .await?
            .ok_or_else(|| ReviewError::RecordNotFound {
                reference: reference.clone(),
            })?;
        Ok(normalize(&record, reference))
    }

    /// Read several protocols concurrently, preserving input order
    ///
    /// # Errors
    /// The first failure in input order
    pub async fn read_many(&self, references: &[ProtocolRef]) -> Result<Vec<Protocol>, ReviewError> {
        join_all(references.iter().map(|reference| self.get(reference)))
            .await
            .into_iter()
            .collect()
    }

    /// Atomically swap the reviewer on one assignment
    ///
    /// # Errors
    /// - `ReviewError::RecordNotFound` for a missing protocol
    /// - `ReviewError::AssignmentNotFound` when `change.from` is not assigned
    /// - `ReviewError::Store` for transport failures
    pub async fn reassign(
        &self,
        reference: &ProtocolRef,
        change: &Reassignment,
    ) -> Result<Protocol, ReviewError> {
        transactor::reassign(
            &self.store,
            reference,
            change,
            self.config.short_name_warning_len,
        )
        .await
    }

    /// Atomically submit or revert one reviewer's review
    ///
    /// # Errors
    /// As [`Self::reassign`]
    pub async fn set_review_status(
        &self,
        reference: &ProtocolRef,
        change: &StatusChange,
    ) -> Result<Protocol, ReviewError> {
        transactor::set_review_status(
            &self.store,
            reference,
            change,
            self.config.short_name_warning_len,
        )
        .await
    }
}
