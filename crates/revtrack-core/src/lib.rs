//! Revtrack Core - review state reconciliation rules
//!
//! The canonical model and the pure rules every dashboard view shares:
//! - Loose reviewer identity matching
//! - Calendar-date normalization of stored values
//! - Overdue / due-soon classification
//! - Representative due-date resolution
//! - Aggregate status derivation
//!
//! Nothing here touches storage; all functions are stateless and safe to
//! call concurrently on disjoint inputs.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use revtrack_core::{aggregate_status, resolve_representative_due_date};
//! use revtrack_core::{Protocol, ProtocolStatus, ReviewerAssignment};
//!
//! let day = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
//! let protocol = Protocol::new("P-1", "Sleep study")
//!     .with_assignment(
//!         ReviewerAssignment::new("R1", "Dr. Yu")
//!             .with_due_date(day(1, 1))
//!             .completed_on(day(1, 2)),
//!     )
//!     .with_assignment(ReviewerAssignment::new("R2", "Dr. Fermin").with_due_date(day(6, 1)));
//!
//! assert_eq!(aggregate_status(&protocol), ProtocolStatus::PartiallyCompleted);
//! assert_eq!(resolve_representative_due_date(&protocol, day(5, 1)), Some(day(6, 1)));
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod date;
pub mod due_date;
pub mod error;
pub mod identity;
pub mod model;
pub mod status;
pub mod temporal;

pub use config::EngineConfig;
pub use date::{canonical_date_string, normalize_date, parse_date_text, parse_date_value, AsCalendarDate};
pub use due_date::resolve_representative_due_date;
pub use error::{ConfigError, ParseError};
pub use identity::{best_match, match_kind, matches, MatchKind};
pub use model::{
    Protocol, ProtocolRef, ProtocolStatus, RecordShape, ReviewStatus, ReviewerAssignment,
    ReviewerIdentity,
};
pub use status::{aggregate_assignments, aggregate_status};
pub use temporal::{is_due_soon, is_overdue, TemporalPolicy, Urgency};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the reconciliation core
    pub use crate::{
        aggregate_status, resolve_representative_due_date, AsCalendarDate, EngineConfig,
        Protocol, ProtocolRef, ProtocolStatus, ReviewStatus, ReviewerAssignment,
        ReviewerIdentity, TemporalPolicy, Urgency,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
