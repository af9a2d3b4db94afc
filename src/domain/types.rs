/// Core value types used throughout the domain layer
///
/// This module defines the identifier and calendar-day types that Habit,
/// CompletionRecord, and the analytics layer are built on.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::domain::DomainError;

/// Unique identifier for a habit
///
/// New habits get a UUID v4 string, but ids created by older clients
/// (e.g. millisecond timestamps) are kept verbatim, so this wraps a String.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(pub String);

impl HabitId {
    /// Generate a new random habit ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a habit ID from a string (useful for database loading)
    pub fn from_string(s: &str) -> Result<Self, DomainError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidHabitId(s.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for HabitId {
    fn default() -> Self {
        Self::new()
    }
}

impl Borrow<str> for HabitId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A calendar day in the local calendar, rendered as `YYYY-MM-DD`
///
/// Stored as a `NaiveDate` so that stepping between days is plain calendar
/// arithmetic. There is no time zone attached: by the time a value becomes a
/// DateKey it has already been resolved to the local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub const FORMAT: &'static str = "%Y-%m-%d";

    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build a key from year/month/day, `None` if the day does not exist
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The calendar day before this one, `None` at the start of the calendar
    pub fn pred(&self) -> Option<Self> {
        self.add_days(-1)
    }

    /// The calendar day after this one, `None` at the end of the calendar
    pub fn succ(&self) -> Option<Self> {
        self.add_days(1)
    }

    /// Step `days` forward (or back when negative), `None` past the calendar bounds
    pub fn add_days(&self, days: i64) -> Option<Self> {
        let step = Days::new(days.unsigned_abs());
        let date = if days >= 0 {
            self.0.checked_add_days(step)
        } else {
            self.0.checked_sub_days(step)
        };
        date.map(Self)
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = DomainError;

    /// Strict parse: exactly `YYYY-MM-DD` with zero padding
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !has_date_key_shape(s) {
            return Err(DomainError::InvalidDate(format!("'{}' is not a YYYY-MM-DD key", s)));
        }
        NaiveDate::parse_from_str(s, Self::FORMAT)
            .map(Self)
            .map_err(|_| DomainError::InvalidDate(format!("'{}' is not a calendar day", s)))
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// True when `s` looks like `YYYY-MM-DD` (digits and dashes in place)
pub(crate) fn has_date_key_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
