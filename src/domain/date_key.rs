/// Normalization of date-like values into local calendar-day keys
///
/// Completion dates reach us as `YYYY-MM-DD` strings, ISO timestamps, epoch
/// numbers (seconds or milliseconds), chrono values, or junk. Everything goes
/// through `normalize` before it is compared or stored, and the calendar day
/// is always taken in the local zone, never from the UTC representation.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::domain::types::has_date_key_shape;
use crate::domain::DateKey;

/// Epoch values below this are seconds, at or above it milliseconds
pub const EPOCH_MILLIS_THRESHOLD: f64 = 1e12;

/// Wall-clock formats that carry no offset and are read as local time
const LOCAL_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Date-only formats accepted besides the canonical key
const LOCAL_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Anything that might describe a calendar day
#[derive(Debug, Clone, PartialEq)]
pub enum DateInput {
    /// Free text: a key, an ISO timestamp, RFC 2822, ...
    Text(String),
    /// Epoch time, seconds or milliseconds
    Number(f64),
    /// A resolved instant
    Instant(DateTime<Utc>),
    /// A day that is already local
    Date(NaiveDate),
    /// Null, booleans, containers: never a date
    Missing,
}

impl From<&str> for DateInput {
    fn from(s: &str) -> Self {
        DateInput::Text(s.to_string())
    }
}

impl From<String> for DateInput {
    fn from(s: String) -> Self {
        DateInput::Text(s)
    }
}

impl From<f64> for DateInput {
    fn from(n: f64) -> Self {
        DateInput::Number(n)
    }
}

impl From<i64> for DateInput {
    fn from(n: i64) -> Self {
        DateInput::Number(n as f64)
    }
}

impl From<NaiveDate> for DateInput {
    fn from(date: NaiveDate) -> Self {
        DateInput::Date(date)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateInput {
    fn from(instant: DateTime<Tz>) -> Self {
        DateInput::Instant(instant.with_timezone(&Utc))
    }
}

impl<T: Into<DateInput>> From<Option<T>> for DateInput {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(DateInput::Missing)
    }
}

impl From<&Value> for DateInput {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => DateInput::Text(s.clone()),
            Value::Number(n) => n.as_f64().map(DateInput::Number).unwrap_or(DateInput::Missing),
            _ => DateInput::Missing,
        }
    }
}

/// Normalize against the machine's local time zone
pub fn normalize(input: impl Into<DateInput>) -> Option<DateKey> {
    normalize_in(&input.into(), &Local)
}

/// Normalize against an explicit time zone
///
/// Returns `None` for anything that does not resolve to a real calendar
/// day. Callers drop `None`; it never stands in for "today".
pub fn normalize_in<Tz: TimeZone>(input: &DateInput, tz: &Tz) -> Option<DateKey> {
    match input {
        DateInput::Text(text) => normalize_text(text, tz),
        DateInput::Number(n) => instant_from_epoch(*n).map(|t| local_key(&t, tz)),
        DateInput::Instant(t) => Some(local_key(t, tz)),
        DateInput::Date(date) => Some(DateKey::new(*date)),
        DateInput::Missing => None,
    }
}

fn normalize_text<Tz: TimeZone>(text: &str, tz: &Tz) -> Option<DateKey> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if has_date_key_shape(text) {
        return text.parse().ok();
    }

    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Some(local_key(&t, tz));
    }
    if let Ok(t) = DateTime::parse_from_rfc2822(text) {
        return Some(local_key(&t, tz));
    }

    for format in LOCAL_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(DateKey::new(naive.date()));
        }
    }
    for format in LOCAL_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(DateKey::new(date));
        }
    }

    None
}

/// Interpret an epoch number, seconds below 1e12 and milliseconds above
fn instant_from_epoch(n: f64) -> Option<DateTime<Utc>> {
    if !n.is_finite() {
        return None;
    }
    let millis = if n < EPOCH_MILLIS_THRESHOLD { n * 1000.0 } else { n };
    DateTime::from_timestamp_millis(millis.trunc() as i64)
}

fn local_key<Src: TimeZone, Tz: TimeZone>(instant: &DateTime<Src>, tz: &Tz) -> DateKey {
    DateKey::new(instant.with_timezone(tz).date_naive())
}
