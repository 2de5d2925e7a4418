//! Revtrack Report - cross-protocol dashboard views
//!
//! Read-only folds over normalized protocols:
//! - [`overdue_assignments`] / [`due_soon_assignments`]: pending assignments by deadline
//! - [`reviewer_stats`] / [`speed_rankings`]: workload and completion speed per reviewer
//! - [`completion_by_period`]: completed vs. not per release period
//! - [`ProtocolSummary`]: status, representative due date and badge for one protocol
//! - [`reviewer_queue`]: everything one reviewer holds
//! - [`Dashboard`]: all of the above in one serializable bundle
//!
//! Every view is recomputed on demand; nothing is cached between calls.

#![warn(unreachable_pub)]

pub mod dashboard;
pub mod deadlines;
pub mod periods;
pub mod queue;
pub mod stats;
pub mod summary;

pub use dashboard::Dashboard;
pub use deadlines::{due_soon_assignments, overdue_assignments, AssignmentRow};
pub use periods::{compare_periods, completion_by_period, period_rank, PeriodTally};
pub use queue::{reviewer_queue, QueueEntry};
pub use stats::{reviewer_stats, speed_rankings, ReviewerStats, SpeedStat};
pub use summary::{summarize_all, ProtocolSummary};
