//! Calendar-date normalization
//!
//! Stored due dates and timestamps arrive as date-only text, date-time text,
//! or store-native timestamp objects. All of them reduce to a
//! [`NaiveDate`]; time-of-day is dropped and textual values keep the date
//! components exactly as written (no timezone conversion).

use crate::error::ParseError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use serde_json::Value;

/// Date-only text layouts, tried in order
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Date-time text layouts without offset, tried in order
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Anything that can serve as "now" for temporal classification
pub trait AsCalendarDate {
    /// Calendar date with time-of-day discarded
    fn calendar_date(&self) -> NaiveDate;
}

impl AsCalendarDate for NaiveDate {
    #[inline]
    fn calendar_date(&self) -> NaiveDate {
        *self
    }
}

impl AsCalendarDate for NaiveDateTime {
    #[inline]
    fn calendar_date(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> AsCalendarDate for DateTime<Tz> {
    #[inline]
    fn calendar_date(&self) -> NaiveDate {
        self.date_naive()
    }
}

/// Parse a textual date or date-time into its calendar date
///
/// # Errors
/// - `ParseError::Empty` for blank text
/// - `ParseError::UnrecognizedDate` when no accepted layout matches
pub fn parse_date_text(text: &str) -> Result<NaiveDate, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Ok(date);
        }
    }

    // Offset-bearing text keeps its own wall-clock date
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt.date());
        }
    }

    // Unusual time suffixes: accept when a full date prefix is followed by a time separator
    if let (Some(prefix), Some(sep)) = (text.get(..10), text.get(10..11)) {
        if matches!(sep, "T" | " ") {
            if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
                return Ok(date);
            }
        }
    }

    Err(ParseError::UnrecognizedDate(text.to_string()))
}

/// Parse a raw stored value into its calendar date
///
/// Accepts text (see [`parse_date_text`]), store-native timestamp objects
/// (`{seconds, nanoseconds}` or `{_seconds, _nanoseconds}`), and integers
/// holding epoch milliseconds. Timestamps are read in UTC.
///
/// # Errors
/// Any value that does not yield a calendar date.
pub fn parse_date_value(value: &Value) -> Result<NaiveDate, ParseError> {
    match value {
        Value::Null => Err(ParseError::Empty),
        Value::String(text) => parse_date_text(text),
        Value::Number(n) => {
            let millis = n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .ok_or(ParseError::UnsupportedType("number"))?;
            DateTime::from_timestamp_millis(millis)
                .map(|dt| dt.date_naive())
                .ok_or(ParseError::TimestampOutOfRange(millis))
        }
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
                .ok_or(ParseError::UnsupportedType("object"))?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let nanos = u32::try_from(nanos).map_err(|_| ParseError::TimestampOutOfRange(seconds))?;
            DateTime::from_timestamp(seconds, nanos)
                .map(|dt| dt.date_naive())
                .ok_or(ParseError::TimestampOutOfRange(seconds))
        }
        Value::Bool(_) => Err(ParseError::UnsupportedType("bool")),
        Value::Array(_) => Err(ParseError::UnsupportedType("array")),
    }
}

/// Normalize an optional stored value, degrading failures to "no date"
#[must_use]
pub fn normalize_date(value: Option<&Value>) -> Option<NaiveDate> {
    let value = value?;
    match parse_date_value(value) {
        Ok(date) => Some(date),
        Err(ParseError::Empty) => None,
        Err(err) => {
            tracing::debug!(%err, "unparseable date normalized to none");
            None
        }
    }
}

/// Canonical `YYYY-MM-DD` text for a date
#[inline]
#[must_use]
pub fn canonical_date_string(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
