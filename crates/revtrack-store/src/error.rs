//! Error types for storage and review updates
//!
//! Structural failures (missing record, missing assignment) always surface
//! to the caller. Per-field parse failures never reach this layer; the
//! normalizer absorbs them.

use revtrack_core::ProtocolRef;

/// Transport-level failures reported by a document store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend unavailable or request failed
    #[error("store transport failed: {0}")]
    Transport(String),

    /// Export document could not be encoded or decoded
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Export file could not be read or written
    #[error("i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Review engine error type
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// No record at the given storage path
    #[error("protocol not found: {reference}")]
    RecordNotFound {
        /// Path that was looked up
        reference: ProtocolRef,
    },

    /// No assignment on the protocol matches the reviewer
    #[error("no assignment for reviewer {reviewer} on protocol {reference}")]
    AssignmentNotFound {
        /// Protocol that was searched
        reference: ProtocolRef,
        /// Reviewer that matched no assignment
        reviewer: String,
    },

    /// Record exists but cannot be written back safely
    #[error("invalid record {reference}: {reason}")]
    InvalidRecord {
        /// Protocol that was read
        reference: ProtocolRef,
        /// What makes the record unwritable
        reason: String,
    },

    /// Store transport error, propagated unchanged
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReviewError {
    /// Check for a missing record or assignment
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::RecordNotFound { .. } | Self::AssignmentNotFound { .. }
        )
    }

    /// Check whether the failure points at a caller logic error rather than the backend
    #[inline]
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, Self::Store(_))
    }

    /// Check if a retry could succeed; the engine itself never retries
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(StoreError::Transport(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let missing = ReviewError::RecordNotFound {
            reference: ProtocolRef::flat("P1"),
        };
        assert!(missing.is_not_found());
        assert!(missing.is_caller_error());
        assert!(!missing.is_retryable());

        let transport = ReviewError::from(StoreError::Transport("timeout".to_string()));
        assert!(!transport.is_not_found());
        assert!(!transport.is_caller_error());
        assert!(transport.is_retryable());
    }

    #[test]
    fn display_names_reviewer_and_path() {
        let err = ReviewError::AssignmentNotFound {
            reference: ProtocolRef::nested("2024-05", "week-1", "P1"),
            reviewer: "DRAPL-001".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no assignment for reviewer DRAPL-001 on protocol 2024-05/week-1/P1"
        );
    }
}
