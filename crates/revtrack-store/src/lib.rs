//! Revtrack Store - raw records, normalization and atomic review updates
//!
//! Bridges the document store holding protocol records and the canonical
//! model in `revtrack-core`:
//! - [`RawRecord`]: untyped field map as it sits in storage
//! - [`normalize`]: legacy or current shape → [`revtrack_core::Protocol`]
//! - [`DocumentStore`]: the three operations the engine needs from a backend
//! - [`transactor`]: reassignment and status changes as one atomic write
//! - [`ProtocolRepository`]: stateless facade the reports and CLI read through
//!
//! [`InMemoryStore`] is the bundled backend, loadable from a JSON export.

#![warn(unreachable_pub)]

pub mod error;
pub mod memory;
pub mod normalize;
pub mod raw;
pub mod repository;
pub mod store;
pub mod transactor;

pub use error::{ReviewError, StoreError};
pub use memory::{Commit, InMemoryStore, StoreExport, JOURNAL_TAIL};
pub use normalize::normalize;
pub use raw::{RawRecord, RawShape};
pub use repository::ProtocolRepository;
pub use store::{DocumentStore, Enumeration, RecordMutator, StoredRecord};
pub use transactor::{Reassignment, StatusChange};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for reading and updating protocols
    pub use crate::{
        DocumentStore, InMemoryStore, ProtocolRepository, RawRecord, Reassignment, ReviewError,
        StatusChange,
    };
}
