//! Canonical review model
//!
//! Every component downstream of the normalizer works on these types only:
//! - [`Protocol`] with its [`ReviewerAssignment`] set
//! - [`ReviewStatus`] per assignment and [`ProtocolStatus`] per protocol
//! - [`ProtocolRef`], the storage-path token used to target write-back
//! - [`ReviewerIdentity`], the (id, name) pair fed to identity matching

use crate::error::ParseError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowercase and strip separators so "In Progress", "in_progress" and
/// "IN-PROGRESS" compare equal.
fn status_token(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Per-assignment review state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReviewStatus {
    /// Review not yet submitted (also the reading of a missing status)
    #[default]
    InProgress,
    /// Reviewer has submitted
    Completed,
}

impl ReviewStatus {
    /// Lenient parse of a stored status value; absence or unknown text is `InProgress`
    #[must_use]
    pub fn parse(text: Option<&str>) -> Self {
        match text.map(status_token).as_deref() {
            Some("completed" | "complete" | "done") => Self::Completed,
            _ => Self::InProgress,
        }
    }

    /// Text written back to the store
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }

    /// Check for `Completed`
    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol-level status derived from the assignment statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProtocolStatus {
    /// No assignment completed
    #[default]
    InProgress,
    /// Some but not all assignments completed
    PartiallyCompleted,
    /// Every assignment completed
    Completed,
}

impl ProtocolStatus {
    /// Lenient parse of a stored protocol status
    #[must_use]
    pub fn parse(text: Option<&str>) -> Self {
        match text.map(status_token).as_deref() {
            Some("completed" | "complete" | "done") => Self::Completed,
            Some("partiallycompleted" | "partial" | "partiallycomplete") => {
                Self::PartiallyCompleted
            }
            _ => Self::InProgress,
        }
    }

    /// Text written back to the store
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "In Progress",
            Self::PartiallyCompleted => "Partially Completed",
            Self::Completed => "Completed",
        }
    }

    /// Check for `Completed`
    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for ProtocolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reviewer identity as presented to the matcher
///
/// Historical records store either a code, a full name, or a partial name
/// in either slot, so neither field is trusted to be unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewerIdentity {
    /// Opaque reviewer identifier
    pub id: String,
    /// Free-text display name
    pub name: String,
}

impl ReviewerIdentity {
    /// Create identity from id and name
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Identity known only by id; the id doubles as the name so records
    /// that stored the code in their name slot still match by exact name.
    /// A single-token id in the name slot never takes part in substring
    /// matching.
    #[inline]
    #[must_use]
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
        }
    }
}

impl fmt::Display for ReviewerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() || self.name == self.id {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.name, self.id)
        }
    }
}

/// One reviewer paired with one protocol for one document type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerAssignment {
    /// Reviewer identifier
    pub reviewer_id: String,
    /// Reviewer display name
    pub reviewer_name: String,
    /// Review state
    pub status: ReviewStatus,
    /// Assigned document/form type code
    pub document_type: Option<String>,
    /// Assignment-specific due date; overrides the protocol due date
    pub due_date: Option<NaiveDate>,
    /// Set only while `status` is `Completed`
    pub completed_at: Option<NaiveDate>,
}

impl ReviewerAssignment {
    /// Create an in-progress assignment
    #[must_use]
    pub fn new(reviewer_id: impl Into<String>, reviewer_name: impl Into<String>) -> Self {
        Self {
            reviewer_id: reviewer_id.into(),
            reviewer_name: reviewer_name.into(),
            status: ReviewStatus::InProgress,
            document_type: None,
            due_date: None,
            completed_at: None,
        }
    }

    /// With document type
    #[inline]
    #[must_use]
    pub fn with_document_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = Some(document_type.into());
        self
    }

    /// With own due date
    #[inline]
    #[must_use]
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Mark completed on the given date
    #[inline]
    #[must_use]
    pub fn completed_on(mut self, date: NaiveDate) -> Self {
        self.complete(Some(date));
        self
    }

    /// Transition to `Completed`
    pub fn complete(&mut self, on: Option<NaiveDate>) {
        self.status = ReviewStatus::Completed;
        self.completed_at = on;
    }

    /// Transition back to `InProgress`, clearing the completion date
    pub fn reopen(&mut self) {
        self.status = ReviewStatus::InProgress;
        self.completed_at = None;
    }

    /// Check for `Completed`
    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    /// Identity of the assigned reviewer
    #[must_use]
    pub fn identity(&self) -> ReviewerIdentity {
        ReviewerIdentity::new(self.reviewer_id.clone(), self.reviewer_name.clone())
    }

    /// Own due date if present, else the protocol fallback
    #[inline]
    #[must_use]
    pub fn effective_due_date(&self, protocol_due: Option<NaiveDate>) -> Option<NaiveDate> {
        self.due_date.or(protocol_due)
    }
}

/// Which raw record shape a protocol was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RecordShape {
    /// Single `reviewer` field
    Legacy,
    /// `reviewers` list
    #[default]
    Current,
}

/// Storage-path token recording where a raw record physically lives
///
/// Rendered as `id` for the flat layout and `month/week/id` for the
/// hierarchical one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProtocolRef {
    /// Flat collection
    Flat {
        /// Protocol id
        id: String,
    },
    /// Month/week hierarchy
    Nested {
        /// Month bucket, e.g. `2024-05`
        month: String,
        /// Week bucket within the month, e.g. `week-2`
        week: String,
        /// Protocol id
        id: String,
    },
}

impl ProtocolRef {
    /// Reference into the flat layout
    #[inline]
    #[must_use]
    pub fn flat(id: impl Into<String>) -> Self {
        Self::Flat { id: id.into() }
    }

    /// Reference into the month/week layout
    #[inline]
    #[must_use]
    pub fn nested(month: impl Into<String>, week: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Nested {
            month: month.into(),
            week: week.into(),
            id: id.into(),
        }
    }

    /// Protocol identifier (last segment)
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Flat { id } | Self::Nested { id, .. } => id,
        }
    }

    /// Check for the hierarchical layout
    #[inline]
    #[must_use]
    pub fn is_nested(&self) -> bool {
        matches!(self, Self::Nested { .. })
    }
}

impl fmt::Display for ProtocolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat { id } => write!(f, "{id}"),
            Self::Nested { month, week, id } => write!(f, "{month}/{week}/{id}"),
        }
    }
}

impl FromStr for ProtocolRef {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.split('/').collect();
        if segments.iter().any(|seg| seg.trim().is_empty()) {
            return Err(ParseError::InvalidStoragePath(s.to_string()));
        }
        match segments.as_slice() {
            [id] => Ok(Self::flat(*id)),
            [month, week, id] => Ok(Self::nested(*month, *week, *id)),
            _ => Err(ParseError::InvalidStoragePath(s.to_string())),
        }
    }
}

impl TryFrom<String> for ProtocolRef {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProtocolRef> for String {
    fn from(value: ProtocolRef) -> Self {
        value.to_string()
    }
}

/// A research protocol under multi-reviewer review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protocol {
    /// Protocol identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Reviewer assignments (synthesized from `legacy_reviewer` for legacy records)
    pub assignments: Vec<ReviewerAssignment>,
    /// Legacy single-reviewer field, kept for display
    pub legacy_reviewer: Option<String>,
    /// Record-level document type
    pub document_type: Option<String>,
    /// Protocol-level due date (fallback only)
    pub due_date: Option<NaiveDate>,
    /// Stored status; authoritative only with zero assignments
    pub status: ProtocolStatus,
    /// Creation date
    pub created_at: Option<NaiveDate>,
    /// Free-text release period label
    pub release_period: Option<String>,
    /// Where the raw record lives
    pub storage_path: Option<ProtocolRef>,
    /// Raw shape the record was read from
    pub shape: RecordShape,
}

impl Protocol {
    /// Create an empty current-shape protocol
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            assignments: Vec::new(),
            legacy_reviewer: None,
            document_type: None,
            due_date: None,
            status: ProtocolStatus::InProgress,
            created_at: None,
            release_period: None,
            storage_path: None,
            shape: RecordShape::Current,
        }
    }

    /// With an additional assignment
    #[inline]
    #[must_use]
    pub fn with_assignment(mut self, assignment: ReviewerAssignment) -> Self {
        self.assignments.push(assignment);
        self
    }

    /// With protocol-level due date
    #[inline]
    #[must_use]
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// With stored status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: ProtocolStatus) -> Self {
        self.status = status;
        self
    }

    /// With release period label
    #[inline]
    #[must_use]
    pub fn with_release_period(mut self, period: impl Into<String>) -> Self {
        self.release_period = Some(period.into());
        self
    }

    /// Effective due date of one of this protocol's assignments
    #[inline]
    #[must_use]
    pub fn effective_due_date(&self, assignment: &ReviewerAssignment) -> Option<NaiveDate> {
        assignment.effective_due_date(self.due_date)
    }

    /// Assignments not yet completed
    pub fn pending_assignments(&self) -> impl Iterator<Item = &ReviewerAssignment> {
        self.assignments.iter().filter(|a| !a.is_completed())
    }

    /// Storage reference, defaulting to the flat layout
    #[must_use]
    pub fn reference(&self) -> ProtocolRef {
        self.storage_path
            .clone()
            .unwrap_or_else(|| ProtocolRef::flat(self.id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_status_parse_is_lenient() {
        assert_eq!(ReviewStatus::parse(Some("Completed")), ReviewStatus::Completed);
        assert_eq!(ReviewStatus::parse(Some("COMPLETE")), ReviewStatus::Completed);
        assert_eq!(ReviewStatus::parse(Some("in_progress")), ReviewStatus::InProgress);
        assert_eq!(ReviewStatus::parse(Some("garbage")), ReviewStatus::InProgress);
        assert_eq!(ReviewStatus::parse(None), ReviewStatus::InProgress);
    }

    #[test]
    fn protocol_status_parse() {
        assert_eq!(
            ProtocolStatus::parse(Some("Partially Completed")),
            ProtocolStatus::PartiallyCompleted
        );
        assert_eq!(
            ProtocolStatus::parse(Some("partially_completed")),
            ProtocolStatus::PartiallyCompleted
        );
        assert_eq!(ProtocolStatus::parse(Some("In Progress")), ProtocolStatus::InProgress);
    }

    #[test]
    fn protocol_ref_round_trips_through_text() {
        let nested: ProtocolRef = "2024-05/week-2/P-17".parse().unwrap();
        assert_eq!(nested, ProtocolRef::nested("2024-05", "week-2", "P-17"));
        assert_eq!(nested.to_string(), "2024-05/week-2/P-17");
        assert_eq!(nested.id(), "P-17");

        let flat: ProtocolRef = "P-17".parse().unwrap();
        assert!(!flat.is_nested());
    }

    #[test]
    fn protocol_ref_rejects_malformed_tokens() {
        assert!("a/b".parse::<ProtocolRef>().is_err());
        assert!("a//c".parse::<ProtocolRef>().is_err());
        assert!("".parse::<ProtocolRef>().is_err());
        assert!("a/b/c/d".parse::<ProtocolRef>().is_err());
    }

    #[test]
    fn reopen_clears_completion_date() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut assignment = ReviewerAssignment::new("R1", "Dr. Yu").completed_on(day);
        assert_eq!(assignment.completed_at, Some(day));

        assignment.reopen();
        assert_eq!(assignment.status, ReviewStatus::InProgress);
        assert_eq!(assignment.completed_at, None);
    }

    #[test]
    fn effective_due_date_prefers_own() {
        let own = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let fallback = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        let with_own = ReviewerAssignment::new("R1", "A").with_due_date(own);
        let without = ReviewerAssignment::new("R2", "B");

        assert_eq!(with_own.effective_due_date(Some(fallback)), Some(own));
        assert_eq!(without.effective_due_date(Some(fallback)), Some(fallback));
        assert_eq!(without.effective_due_date(None), None);
    }

    #[test]
    fn identity_display() {
        assert_eq!(ReviewerIdentity::from_id("R-9").to_string(), "R-9");
        assert_eq!(
            ReviewerIdentity::new("R-9", "Dr. Fermin").to_string(),
            "Dr. Fermin (R-9)"
        );
    }
}
