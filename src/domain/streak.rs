/// Streak calculation
///
/// A streak counts consecutive completed days ending yesterday. Today's
/// completion never moves the number: the streak only grows once the day
/// rolls over, so marking today done and undoing it leave it untouched.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{DateKey, Habit, HabitId};

/// Calculated streak information for a habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Streak {
    /// Which habit this streak data is for
    pub habit_id: HabitId,
    /// Consecutive days completed, ending the day before the anchor
    pub current_streak: u32,
    /// Most recent completed day (None if never completed)
    pub last_completed: Option<DateKey>,
    /// Number of unique completed days
    pub total_completions: u32,
}

impl Streak {
    /// Calculate streak information from a habit's completion set
    pub fn calculate(habit_id: HabitId, set: &BTreeSet<DateKey>, anchor: NaiveDate) -> Self {
        Self {
            habit_id,
            current_streak: current_streak(set, anchor),
            last_completed: set.iter().next_back().copied(),
            total_completions: set.len() as u32,
        }
    }

    /// Get a motivational message based on current streak status
    pub fn motivational_message(&self) -> String {
        match self.current_streak {
            0 => "Ready to start your streak! Every journey begins with a single step.".to_string(),
            1 => "Great start! One day down, keep the momentum going.".to_string(),
            2..=6 => format!("Nice work! {} days in a row. You're building a strong habit.", self.current_streak),
            7..=29 => format!("⭐ {} days strong. You're in the groove now!", self.current_streak),
            _ => format!("👑 {} days of consistency. You're a habit master!", self.current_streak),
        }
    }
}

/// Count consecutive days in `set`, starting at `anchor - 1` and walking back
///
/// The anchor day itself is never counted. The walk stops at the first day
/// missing from the set (or at the start of the calendar), so it is bounded
/// by the set's size.
pub fn current_streak(set: &BTreeSet<DateKey>, anchor: NaiveDate) -> u32 {
    if set.is_empty() {
        return 0;
    }

    let mut day = DateKey::new(anchor).pred();
    let mut streak = 0;
    while let Some(key) = day.filter(|key| set.contains(key)) {
        streak += 1;
        day = key.pred();
    }
    streak
}

/// Streaks for every habit, in habit order
pub fn streaks_for(
    habits: &[Habit],
    sets: &HashMap<HabitId, BTreeSet<DateKey>>,
    anchor: NaiveDate,
) -> Vec<Streak> {
    let empty = BTreeSet::new();
    habits
        .iter()
        .map(|habit| {
            let set = sets.get(&habit.id).unwrap_or(&empty);
            Streak::calculate(habit.id.clone(), set, anchor)
        })
        .collect()
}

/// The largest current streak among `streaks`, 0 when there are none
pub fn longest_current_streak(streaks: &[Streak]) -> u32 {
    streaks.iter().map(|s| s.current_streak).max().unwrap_or(0)
}
