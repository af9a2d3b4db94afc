/// Aggregate completion rates
///
/// Every function here is pure over (habits, completion sets, today) and
/// returns the counts behind each percentage alongside it.
///
/// The rolling window and the monthly figure are averaged differently on
/// purpose. The rolling window averages per-day *rates* (a 1/1 day and a
/// 0/10 day average to 50%), while the month averages per-day *counts* and
/// divides by the habit total once at the end.

use std::collections::BTreeSet;

use chrono::{Datelike, Local, NaiveDate, TimeZone};
use serde::Serialize;

use crate::analytics::completion_sets::{CompletionSet, CompletionSets};
use crate::domain::{DateKey, Habit, HabitId};

pub const DEFAULT_ROLLING_WINDOW_DAYS: u32 = 14;

/// `round(ratio * 100)`, ratios are never negative here
fn percent(ratio: f64) -> u32 {
    (ratio * 100.0).round() as u32
}

fn set_for<'a>(sets: &'a CompletionSets, id: &HabitId, empty: &'a CompletionSet) -> &'a CompletionSet {
    sets.get(id).unwrap_or(empty)
}

/// How many of today's habits are done
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayRatio {
    pub date: DateKey,
    pub completed: usize,
    pub total: usize,
    pub percent: u32,
}

impl TodayRatio {
    pub fn motivational_message(&self) -> &'static str {
        match self.percent {
            100 if self.total > 0 => "🎉 Amazing! All habits completed today!",
            75.. => "🚀 Great progress! Keep it up!",
            50.. => "💪 You're doing well! Stay consistent!",
            25.. => "🌟 Good start! Every step counts!",
            _ => "🌱 Every journey begins with a single step!",
        }
    }
}

pub fn today_ratio(habits: &[Habit], sets: &CompletionSets, today: NaiveDate) -> TodayRatio {
    let key = DateKey::new(today);
    let empty = BTreeSet::new();
    let completed = habits
        .iter()
        .filter(|h| set_for(sets, &h.id, &empty).contains(&key))
        .count();
    let total = habits.len();
    let percent = if total == 0 { 0 } else { percent(completed as f64 / total as f64) };

    TodayRatio { date: key, completed, total, percent }
}

/// One day of the rolling window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRate {
    pub date: DateKey,
    pub completed: usize,
    /// Habits that existed on this day
    pub possible: usize,
    /// `completed / possible`, 0 when nothing was possible
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingAverage {
    pub window_days: u32,
    /// Oldest first, the last element is today
    pub days: Vec<DailyRate>,
    /// Equal-weight mean of the daily rates
    pub average_rate: f64,
    pub percent: u32,
}

pub fn rolling_average(
    habits: &[Habit],
    sets: &CompletionSets,
    today: NaiveDate,
    window_days: u32,
) -> RollingAverage {
    rolling_average_in(habits, sets, today, window_days, &Local)
}

/// Rolling window where habit creation days are read in `tz`
pub fn rolling_average_in<Tz: TimeZone>(
    habits: &[Habit],
    sets: &CompletionSets,
    today: NaiveDate,
    window_days: u32,
    tz: &Tz,
) -> RollingAverage {
    let empty = BTreeSet::new();
    let created: Vec<(NaiveDate, &CompletionSet)> = habits
        .iter()
        .map(|h| (h.created_on_in(tz), set_for(sets, &h.id, &empty)))
        .collect();

    let today_key = DateKey::new(today);
    // Days before the start of the calendar are left out of the window
    let days: Vec<DailyRate> = (0..window_days)
        .rev()
        .filter_map(|back| today_key.add_days(-i64::from(back)))
        .map(|date| {
            let alive = created.iter().filter(|(created_on, _)| *created_on <= date.date());
            let (possible, completed) = alive.fold((0, 0), |(possible, completed), (_, set)| {
                (possible + 1, completed + usize::from(set.contains(&date)))
            });
            let rate = if possible == 0 { 0.0 } else { completed as f64 / possible as f64 };
            DailyRate { date, completed, possible, rate }
        })
        .collect();

    let average_rate = if days.is_empty() {
        0.0
    } else {
        days.iter().map(|d| d.rate).sum::<f64>() / days.len() as f64
    };

    RollingAverage {
        window_days,
        days,
        average_rate,
        percent: percent(average_rate),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAverage {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    /// Completed habits per day, index 0 is the 1st
    pub daily_completed: Vec<usize>,
    pub total_completed: usize,
    pub total_habits: usize,
    /// `total_completed / days_in_month`
    pub average_completed: f64,
    pub percent: u32,
}

/// Number of days in `month` of `year`
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (first, next) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 0,
    }
}

/// Average over every day of the month containing `today`
pub fn monthly_average(habits: &[Habit], sets: &CompletionSets, today: NaiveDate) -> MonthlyAverage {
    let (year, month) = (today.year(), today.month());
    let days_in_month = days_in_month(year, month);
    let empty = BTreeSet::new();

    let daily_completed: Vec<usize> = (1..=days_in_month)
        .filter_map(|day| DateKey::from_ymd(year, month, day))
        .map(|key| {
            habits
                .iter()
                .filter(|h| set_for(sets, &h.id, &empty).contains(&key))
                .count()
        })
        .collect();

    let total_completed: usize = daily_completed.iter().sum();
    let total_habits = habits.len();
    let average_completed = if days_in_month == 0 {
        0.0
    } else {
        total_completed as f64 / f64::from(days_in_month)
    };
    let percent = if total_habits == 0 {
        0
    } else {
        percent(average_completed / total_habits as f64)
    };

    MonthlyAverage {
        year,
        month,
        days_in_month,
        daily_completed,
        total_completed,
        total_habits,
        average_completed,
        percent,
    }
}

/// Completion rate of one habit since it was created
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifetimeRate {
    pub habit_id: HabitId,
    pub name: String,
    pub icon: String,
    /// Unique completed days
    pub completion_count: usize,
    pub days_alive: u32,
    /// `days_alive * frequency_per_day`
    pub expected: u64,
    /// Percent, capped at 100
    pub rate: u32,
}

pub fn lifetime_rates(habits: &[Habit], sets: &CompletionSets, today: NaiveDate) -> Vec<LifetimeRate> {
    lifetime_rates_in(habits, sets, today, &Local)
}

/// Lifetime rates sorted best first; equal rates keep habit order
pub fn lifetime_rates_in<Tz: TimeZone>(
    habits: &[Habit],
    sets: &CompletionSets,
    today: NaiveDate,
    tz: &Tz,
) -> Vec<LifetimeRate> {
    let empty = BTreeSet::new();
    let mut rates: Vec<LifetimeRate> = habits
        .iter()
        .map(|habit| {
            let completion_count = set_for(sets, &habit.id, &empty).len();
            let days_alive = (today - habit.created_on_in(tz)).num_days().saturating_add(1).max(1) as u32;
            let expected = u64::from(days_alive) * u64::from(habit.frequency_per_day.max(1));
            let rate = percent(completion_count as f64 / expected as f64).min(100);

            LifetimeRate {
                habit_id: habit.id.clone(),
                name: habit.name.clone(),
                icon: habit.icon.clone(),
                completion_count,
                days_alive,
                expected,
                rate,
            }
        })
        .collect();

    // sort_by is stable
    rates.sort_by(|a, b| b.rate.cmp(&a.rate));
    rates
}

/// The first `n` of already-sorted lifetime rates
pub fn top_habits(rates: &[LifetimeRate], n: usize) -> Vec<LifetimeRate> {
    rates.iter().take(n).cloned().collect()
}
