/// Month heat map
///
/// One cell per day of a month, preceded by blanks so the 1st lands under
/// its weekday in a Sunday-first grid.

use std::collections::BTreeSet;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::analytics::completion_sets::CompletionSets;
use crate::analytics::rates::days_in_month;
use crate::domain::{DateKey, DomainError, Habit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    None,
    Partial,
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub date: DateKey,
    pub completed: usize,
    pub total: usize,
    pub status: DayStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    /// Blank cells before the 1st, 0 when the month starts on Sunday
    pub leading_blanks: u32,
    pub days: Vec<CalendarDay>,
}

impl CalendarMonth {
    /// Cells in grid order, `None` for the leading blanks
    pub fn cells(&self) -> Vec<Option<&CalendarDay>> {
        (0..self.leading_blanks)
            .map(|_| None)
            .chain(self.days.iter().map(Some))
            .collect()
    }

    /// Render as a Sunday-first text grid: `#` full, `+` partial, `.` none
    pub fn render_text(&self) -> String {
        let mut out = String::from(" Su Mo Tu We Th Fr Sa\n");
        for (i, cell) in self.cells().iter().enumerate() {
            let mark = match cell {
                None => "    ".to_string(),
                Some(day) => {
                    let symbol = match day.status {
                        DayStatus::Full => '#',
                        DayStatus::Partial => '+',
                        DayStatus::None => '.',
                    };
                    format!("{:>3}{}", day.date.day(), symbol)
                }
            };
            out.push_str(&mark);
            if i % 7 == 6 {
                out.push('\n');
            }
        }
        out.trim_end().to_string()
    }
}

fn status(completed: usize, total: usize) -> DayStatus {
    if completed == 0 {
        DayStatus::None
    } else if completed == total {
        DayStatus::Full
    } else {
        DayStatus::Partial
    }
}

pub fn calendar_month(
    habits: &[Habit],
    sets: &CompletionSets,
    year: i32,
    month: u32,
) -> Result<CalendarMonth, DomainError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        DomainError::InvalidDate(format!("no such month: {}-{:02}", year, month))
    })?;

    let empty = BTreeSet::new();
    let total = habits.len();
    let days = (1..=days_in_month(year, month))
        .filter_map(|day| DateKey::from_ymd(year, month, day))
        .map(|date| {
            let completed = habits
                .iter()
                .filter(|h| sets.get(&h.id).unwrap_or(&empty).contains(&date))
                .count();
            CalendarDay { date, completed, total, status: status(completed, total) }
        })
        .collect();

    Ok(CalendarMonth {
        year,
        month,
        leading_blanks: first.weekday().num_days_from_sunday(),
        days,
    })
}

/// Move `(year, month)` by `delta` months
pub fn shift_month(year: i32, month: u32, delta: i32) -> Option<(i32, u32)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let shifted = if delta >= 0 {
        first.checked_add_months(Months::new(delta.unsigned_abs()))?
    } else {
        first.checked_sub_months(Months::new(delta.unsigned_abs()))?
    };
    Some((shifted.year(), shifted.month()))
}
