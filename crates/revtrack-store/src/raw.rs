//! Raw record shapes
//!
//! A raw record is the field map exactly as the document store holds it.
//! Two shapes coexist:
//! - current: a `reviewers` list of assignment maps
//! - legacy: a single `reviewer` string with record-level status/due date
//!
//! [`RawShape`] is the tagged union the normalizer and transactor branch on;
//! nothing else in the workspace looks at raw fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names recognised on raw records and assignment maps
pub mod fields {
    /// Current-shape assignment list
    pub const REVIEWERS: &str = "reviewers";
    /// Legacy single reviewer
    pub const REVIEWER: &str = "reviewer";
    /// Legacy reviewer display name
    pub const REVIEWER_NAME: &str = "reviewer_name";
    /// Assignment reviewer id
    pub const ID: &str = "id";
    /// Assignment reviewer id (alternate)
    pub const REVIEWER_ID: &str = "reviewer_id";
    /// Assignment reviewer name
    pub const NAME: &str = "name";
    /// Document type
    pub const DOCUMENT_TYPE: &str = "document_type";
    /// Per-assignment form type (alternate document type)
    pub const FORM_TYPE: &str = "form_type";
    /// Due date
    pub const DUE_DATE: &str = "due_date";
    /// Status
    pub const STATUS: &str = "status";
    /// Creation timestamp
    pub const CREATED_AT: &str = "created_at";
    /// Completion timestamp
    pub const COMPLETED_AT: &str = "completed_at";
    /// Display name candidates, in precedence order
    pub const DISPLAY_NAME: [&str; 3] = ["protocol_name", "name", "title"];
    /// Release period candidates, in precedence order
    pub const RELEASE_PERIOD: [&str; 2] = ["release_period", "period"];
}

/// Raw record: the stored field map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: Map<String, Value>,
}

/// Which shape a raw record carries
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawShape<'a> {
    /// Non-empty `reviewers` list
    Current {
        /// Entries of the list
        reviewers: &'a [Value],
    },
    /// Single `reviewer` string
    Legacy {
        /// Stored reviewer code or name
        reviewer: &'a str,
    },
    /// Neither shape holds a reviewer
    Unassigned,
}

impl RawRecord {
    /// Empty record
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing field map
    #[inline]
    #[must_use]
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build from a JSON value; non-object values yield `None`
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Underlying field map
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Raw field value
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set a field, returning the previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Remove a field
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// With a field set
    #[inline]
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Non-blank string field
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        text_field(&self.fields, key)
    }

    /// First non-blank string among several candidate keys
    #[must_use]
    pub fn first_text(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.text(key))
    }

    /// Detect the record shape; a non-empty `reviewers` list takes precedence
    #[must_use]
    pub fn shape(&self) -> RawShape<'_> {
        if let Some(Value::Array(reviewers)) = self.fields.get(fields::REVIEWERS) {
            if !reviewers.is_empty() {
                return RawShape::Current { reviewers };
            }
        }
        match self.text(fields::REVIEWER) {
            Some(reviewer) => RawShape::Legacy { reviewer },
            None => RawShape::Unassigned,
        }
    }

    /// Mutable access to the `reviewers` list, if it is one
    pub fn reviewers_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self.fields.get_mut(fields::REVIEWERS) {
            Some(Value::Array(list)) => Some(list),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_map(fields)
    }
}

/// Non-blank string field of a JSON map
#[must_use]
pub fn text_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        RawRecord::from_value(value).unwrap()
    }

    #[test]
    fn current_shape_takes_precedence() {
        let r = record(json!({
            "reviewer": "OLD-1",
            "reviewers": [{ "id": "R1", "name": "A" }]
        }));
        assert!(matches!(r.shape(), RawShape::Current { reviewers } if reviewers.len() == 1));
    }

    #[test]
    fn empty_reviewers_falls_back_to_legacy() {
        let r = record(json!({ "reviewer": "DRAPL-001", "reviewers": [] }));
        assert_eq!(r.shape(), RawShape::Legacy { reviewer: "DRAPL-001" });
    }

    #[test]
    fn unassigned_when_neither_present() {
        assert_eq!(record(json!({ "reviewer": "  " })).shape(), RawShape::Unassigned);
        assert_eq!(record(json!({ "reviewers": "oops" })).shape(), RawShape::Unassigned);
    }

    #[test]
    fn first_text_skips_blank_candidates() {
        let r = record(json!({ "protocol_name": "", "name": "Sleep study" }));
        assert_eq!(r.first_text(&fields::DISPLAY_NAME), Some("Sleep study"));
    }

    #[test]
    fn non_object_values_are_rejected() {
        assert!(RawRecord::from_value(json!([1, 2])).is_none());
    }
}
