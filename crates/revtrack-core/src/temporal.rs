//! Overdue / due-soon classification
//!
//! Both predicates compare calendar dates only. A date is overdue when it is
//! strictly before today, and due-soon when it is not overdue and at most
//! `due_soon_days` days ahead (inclusive). The two never hold together.

use crate::date::AsCalendarDate;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default inclusive due-soon window in days
pub const DEFAULT_DUE_SOON_DAYS: i64 = 3;

/// Badge shown for a single due date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Urgency {
    /// Past due and still pending
    Overdue,
    /// Pending and inside the due-soon window
    DueSoon,
    /// Pending with a later due date
    OnTrack,
    /// Pending with no due date
    Undated,
    /// Nothing pending
    Done,
}

/// Shared temporal policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalPolicy {
    /// Inclusive due-soon window in days
    pub due_soon_days: i64,
}

impl Default for TemporalPolicy {
    fn default() -> Self {
        Self {
            due_soon_days: DEFAULT_DUE_SOON_DAYS,
        }
    }
}

impl TemporalPolicy {
    /// Policy with a custom window
    #[inline]
    #[must_use]
    pub fn new(due_soon_days: i64) -> Self {
        Self { due_soon_days }
    }

    /// Strictly earlier than today
    #[must_use]
    pub fn is_overdue(&self, date: Option<NaiveDate>, now: impl AsCalendarDate) -> bool {
        date.is_some_and(|d| d < now.calendar_date())
    }

    /// Not overdue and within the inclusive window
    #[must_use]
    pub fn is_due_soon(&self, date: Option<NaiveDate>, now: impl AsCalendarDate) -> bool {
        let today = now.calendar_date();
        date.is_some_and(|d| {
            let ahead = (d - today).num_days();
            (0..=self.due_soon_days).contains(&ahead)
        })
    }

    /// Badge for a due date on an item that may already be done
    #[must_use]
    pub fn urgency(&self, date: Option<NaiveDate>, completed: bool, now: impl AsCalendarDate) -> Urgency {
        let today = now.calendar_date();
        if completed {
            Urgency::Done
        } else if date.is_none() {
            Urgency::Undated
        } else if self.is_overdue(date, today) {
            Urgency::Overdue
        } else if self.is_due_soon(date, today) {
            Urgency::DueSoon
        } else {
            Urgency::OnTrack
        }
    }
}

/// [`TemporalPolicy::is_overdue`] under the default policy
#[inline]
#[must_use]
pub fn is_overdue(date: Option<NaiveDate>, now: impl AsCalendarDate) -> bool {
    TemporalPolicy::default().is_overdue(date, now)
}

/// [`TemporalPolicy::is_due_soon`] under the default policy
#[inline]
#[must_use]
pub fn is_due_soon(date: Option<NaiveDate>, now: impl AsCalendarDate) -> bool {
    TemporalPolicy::default().is_due_soon(date, now)
}
