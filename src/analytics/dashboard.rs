/// Statistics dashboard
///
/// Everything the statistics view shows, computed in one pass from a
/// snapshot of habits and completion sets.

use chrono::NaiveDate;
use serde::Serialize;

use crate::analytics::completion_sets::CompletionSets;
use crate::analytics::rates::{
    lifetime_rates, monthly_average, rolling_average, today_ratio, top_habits, LifetimeRate,
    MonthlyAverage, RollingAverage, TodayRatio,
};
use crate::domain::{longest_current_streak, streaks_for, Habit, Streak};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub total_habits: usize,
    /// Habits with at least one completion
    pub active_habits: usize,
    pub streaks: Vec<Streak>,
    pub longest_current_streak: u32,
    pub today: TodayRatio,
    pub monthly: MonthlyAverage,
    pub rolling: RollingAverage,
    pub top_habits: Vec<LifetimeRate>,
}

impl Dashboard {
    pub fn compute(
        habits: &[Habit],
        sets: &CompletionSets,
        today: NaiveDate,
        window_days: u32,
        top_n: usize,
    ) -> Self {
        let active_habits = habits
            .iter()
            .filter(|h| sets.get(&h.id).is_some_and(|set| !set.is_empty()))
            .count();
        let streaks = streaks_for(habits, sets, today);
        let rates = lifetime_rates(habits, sets, today);

        Self {
            total_habits: habits.len(),
            active_habits,
            longest_current_streak: longest_current_streak(&streaks),
            streaks,
            today: today_ratio(habits, sets, today),
            monthly: monthly_average(habits, sets, today),
            rolling: rolling_average(habits, sets, today, window_days),
            top_habits: top_habits(&rates, top_n),
        }
    }

    /// Plain-text summary for tool responses
    pub fn summary_text(&self, habits: &[Habit]) -> String {
        let mut lines = vec![
            format!("📊 Statistics for {}", self.today.date),
            format!(
                "Habits: {} total, {} active | Today: {}/{} ({}%)",
                self.total_habits, self.active_habits, self.today.completed, self.today.total, self.today.percent
            ),
            format!(
                "Longest streak: {} days | Monthly avg: {}% | Last {} days: {}%",
                self.longest_current_streak, self.monthly.percent, self.rolling.window_days, self.rolling.percent
            ),
            self.today.motivational_message().to_string(),
        ];

        if !self.top_habits.is_empty() {
            lines.push(String::new());
            lines.push("🏆 Top habits".to_string());
            for top in &self.top_habits {
                let icon = if top.icon.is_empty() { "🔥" } else { top.icon.as_str() };
                lines.push(format!(
                    "{} {} - {}% ({} completions)",
                    icon, top.name, top.rate, top.completion_count
                ));
            }
        }

        if !self.streaks.is_empty() {
            lines.push(String::new());
            for (habit, streak) in habits.iter().zip(&self.streaks) {
                lines.push(format!("🎯 {}: {} day streak", habit.name, streak.current_streak));
            }
        }

        lines.join("\n")
    }
}
