/// Completion set builder
///
/// Turns whatever the completions collection holds into one set of day keys
/// per habit. Three shapes are understood:
///
/// - a map of habit id to an array of entries (or to a `{ dates: [...] }` document),
/// - a flat array of entries that each name their habit,
/// - anything else, which yields empty sets.
///
/// Entries may be bare date values or objects carrying a date field. Entries
/// that do not normalize, or that point at an unknown habit, are skipped.

use std::collections::{BTreeSet, HashMap};

use chrono::{Local, TimeZone};
use serde_json::{Map, Value};

use crate::domain::{normalize, normalize_in, DateInput, DateKey, Habit, HabitId};

pub type CompletionSet = BTreeSet<DateKey>;
pub type CompletionSets = HashMap<HabitId, CompletionSet>;

/// Object fields holding an entry's date, highest priority first
const DATE_FIELDS: &[&str] = &[
    "date",
    "completedAt",
    "completed_at",
    "timestamp",
    "ts",
    "createdAt",
    "created_at",
];

/// How a raw completions value is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionShape {
    /// `{ habitId: [entries] }`
    ByHabit,
    /// `[ { habitId, date }, ... ]`
    Flat,
    Unrecognized,
}

impl CompletionShape {
    pub fn detect(raw: &Value) -> Self {
        if is_by_habit(raw) {
            CompletionShape::ByHabit
        } else if is_flat(raw) {
            CompletionShape::Flat
        } else {
            CompletionShape::Unrecognized
        }
    }
}

fn is_by_habit(raw: &Value) -> bool {
    raw.is_object()
}

fn is_flat(raw: &Value) -> bool {
    raw.is_array()
}

/// Build completion sets against the local time zone
pub fn build_completion_sets(habits: &[Habit], raw: &Value) -> CompletionSets {
    build_completion_sets_in(habits, raw, &Local)
}

/// Build completion sets, resolving instants in `tz`
///
/// Every habit in `habits` has an entry in the result, empty when nothing
/// was recorded for it.
pub fn build_completion_sets_in<Tz: TimeZone>(habits: &[Habit], raw: &Value, tz: &Tz) -> CompletionSets {
    let mut builder = SetBuilder::new(habits, tz);

    match CompletionShape::detect(raw) {
        CompletionShape::ByHabit => {
            if let Value::Object(map) = raw {
                builder.extend_by_habit(map);
            }
        }
        CompletionShape::Flat => {
            if let Value::Array(entries) = raw {
                builder.extend_flat(entries);
            }
        }
        CompletionShape::Unrecognized => {
            if !raw.is_null() {
                tracing::debug!("Ignoring completions value of unrecognized shape");
            }
        }
    }

    builder.finish()
}

struct SetBuilder<'a, Tz: TimeZone> {
    sets: CompletionSets,
    tz: &'a Tz,
    dropped: usize,
    orphaned: usize,
}

impl<'a, Tz: TimeZone> SetBuilder<'a, Tz> {
    fn new(habits: &[Habit], tz: &'a Tz) -> Self {
        let sets = habits
            .iter()
            .map(|habit| (habit.id.clone(), CompletionSet::new()))
            .collect();
        Self { sets, tz, dropped: 0, orphaned: 0 }
    }

    fn extend_by_habit(&mut self, map: &Map<String, Value>) {
        for (habit_id, value) in map {
            for entry in habit_entries(value) {
                self.add(habit_id, entry);
            }
        }
    }

    fn extend_flat(&mut self, entries: &[Value]) {
        for entry in entries {
            let Some(habit_id) = entry_habit_id(entry) else {
                self.dropped += 1;
                continue;
            };
            match entry.get("dates").and_then(Value::as_array) {
                Some(dates) => {
                    for date in dates {
                        self.add(&habit_id, date);
                    }
                }
                None => self.add(&habit_id, entry),
            }
        }
    }

    fn add(&mut self, habit_id: &str, entry: &Value) {
        let Some(set) = self.sets.get_mut(habit_id.trim()) else {
            self.orphaned += 1;
            return;
        };
        match normalize_in(&DateInput::from(entry_date(entry)), self.tz) {
            Some(key) => {
                set.insert(key);
            }
            None => self.dropped += 1,
        }
    }

    fn finish(self) -> CompletionSets {
        if self.dropped > 0 || self.orphaned > 0 {
            tracing::debug!(
                dropped = self.dropped,
                orphaned = self.orphaned,
                "Skipped completion entries while building sets"
            );
        }
        self.sets
    }
}

/// Days in one habit's stored entries, read the way the builder reads them
pub(crate) fn entry_days<'a>(entries: impl IntoIterator<Item = &'a Value>) -> CompletionSet {
    entries.into_iter().filter_map(|entry| normalize(entry_date(entry))).collect()
}

/// Days in the value stored under one habit id (an entry array or a `{ dates }` document)
pub(crate) fn stored_days(value: &Value) -> CompletionSet {
    entry_days(habit_entries(value))
}

/// Entries stored under one habit id in the by-habit shape
fn habit_entries(value: &Value) -> &[Value] {
    match value {
        Value::Array(entries) => entries,
        Value::Object(doc) => doc
            .get("dates")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => &[],
    }
}

/// The value to normalize for one entry
pub(crate) fn entry_date(entry: &Value) -> &Value {
    match entry {
        Value::Object(fields) => DATE_FIELDS
            .iter()
            .find_map(|field| fields.get(*field).filter(|v| !v.is_null()))
            .unwrap_or(entry),
        _ => entry,
    }
}

/// Habit id carried by a flat entry: `habitId`, `habit_id`, `habit.id`, `habit`
fn entry_habit_id(entry: &Value) -> Option<String> {
    let fields = entry.as_object()?;
    fields
        .get("habitId")
        .and_then(id_text)
        .or_else(|| fields.get("habit_id").and_then(id_text))
        .or_else(|| fields.get("habit").and_then(|h| h.get("id")).and_then(id_text))
        .or_else(|| fields.get("habit").and_then(id_text))
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
