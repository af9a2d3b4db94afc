/// CompletionRecord: the set of days a habit was marked done
///
/// One record per habit. Days are unique; toggling a day that is present
/// removes it, toggling an absent day adds it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{DateKey, HabitId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub habit_id: HabitId,
    pub dates: BTreeSet<DateKey>,
}

impl CompletionRecord {
    /// An empty record, created alongside its habit
    pub fn new(habit_id: HabitId) -> Self {
        Self {
            habit_id,
            dates: BTreeSet::new(),
        }
    }

    pub fn with_dates(habit_id: HabitId, dates: impl IntoIterator<Item = DateKey>) -> Self {
        Self {
            habit_id,
            dates: dates.into_iter().collect(),
        }
    }

    /// Flip the completion state of `day`, returning true when it is now complete
    pub fn toggle(&mut self, day: DateKey) -> bool {
        if self.dates.remove(&day) {
            false
        } else {
            self.dates.insert(day);
            true
        }
    }

    pub fn is_completed_on(&self, day: &DateKey) -> bool {
        self.dates.contains(day)
    }

    /// Dates in ascending order, as they are persisted
    pub fn to_vec(&self) -> Vec<DateKey> {
        self.dates.iter().copied().collect()
    }
}
