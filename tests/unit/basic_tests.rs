/// Basic unit tests for the core calculations
use std::collections::BTreeSet;

use chrono::{Local, NaiveDate, TimeZone, Utc};
use habitflow::analytics::{
    build_completion_sets, lifetime_rates, rolling_average, today_ratio, CompletionSets,
};
use habitflow::*;
use serde_json::json;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// A habit created at local noon on `created`
fn habit(id: &str, created: &str) -> Habit {
    let local_noon = Local
        .from_local_datetime(&date(created).and_hms_opt(12, 0, 0).unwrap())
        .single()
        .unwrap();
    Habit::from_existing(
        HabitId(id.to_string()),
        format!("habit {}", id),
        String::new(),
        local_noon.with_timezone(&Utc),
        String::new(),
        String::new(),
        1,
    )
}

#[cfg(test)]
mod basic_unit_tests {
    use super::*;

    #[test]
    fn test_habit_creation() {
        let habit = Habit::new(
            "Test Habit".to_string(),
            Some("A test habit".to_string()),
            None,
            None,
            None,
        );

        assert!(habit.is_ok());
        let habit = habit.unwrap();
        assert_eq!(habit.name, "Test Habit");
        assert_eq!(habit.frequency_per_day, 1);
    }

    #[test]
    fn test_empty_completions_give_empty_set_per_habit() {
        let habits = vec![habit("a", "2024-01-01"), habit("b", "2024-01-01")];
        let sets = build_completion_sets(&habits, &json!({}));
        assert_eq!(sets.len(), 2);
        assert!(sets.values().all(BTreeSet::is_empty));
    }

    #[test]
    fn test_streak_counts_from_yesterday() {
        let today = date("2024-05-10");
        let yesterday = DateKey::new(today).pred().unwrap();
        let mut set = BTreeSet::new();
        assert_eq!(current_streak(&set, today), 0);

        set.insert(yesterday);
        set.insert(yesterday.pred().unwrap());
        assert_eq!(current_streak(&set, today), 2);

        set.insert(DateKey::new(today));
        assert_eq!(current_streak(&set, today), 2);
    }

    #[test]
    fn test_rolling_window_averages_daily_rates() {
        let today = date("2024-05-14");
        let habits = vec![habit("a", "2024-05-14")];
        let raw = json!({"a": ["2024-05-14"]});
        let sets = build_completion_sets(&habits, &raw);

        // One 1/1 day and thirteen 0/0 days
        let rolling = rolling_average(&habits, &sets, today, 14);
        assert_eq!(rolling.days.len(), 14);
        assert_eq!(rolling.percent, 7);
    }

    #[test]
    fn test_created_day_and_three_completions() {
        let d = date("2024-03-10");
        let habits = vec![habit("a", "2024-03-10")];
        let raw = json!({"a": ["2024-03-10", "2024-03-11", "2024-03-13"]});
        let sets: CompletionSets = build_completion_sets(&habits, &raw);
        let today = d + chrono::Duration::days(4);

        let set = &sets[&HabitId("a".to_string())];
        assert_eq!(current_streak(set, today), 1);

        let rates = lifetime_rates(&habits, &sets, today);
        assert_eq!(rates[0].days_alive, 5);
        assert_eq!(rates[0].rate, 60);

        assert_eq!(today_ratio(&habits, &sets, today).completed, 0);
    }

    #[test]
    fn test_lifetime_rate_capped() {
        let mut h = habit("a", "2024-05-10");
        h.frequency_per_day = 1;
        let habits = vec![h];
        // Completions before creation still count toward the numerator
        let raw = json!({"a": ["2024-05-07", "2024-05-08", "2024-05-09", "2024-05-10"]});
        let sets = build_completion_sets(&habits, &raw);
        let rates = lifetime_rates(&habits, &sets, date("2024-05-10"));
        assert_eq!(rates[0].rate, 100);
    }

    #[test]
    fn test_analytics_engine_creation() {
        let engine = AnalyticsEngine::new(AnalyticsConfig::default());
        assert_eq!(engine.config().rolling_window_days, 14);
        assert_eq!(engine.config().top_habits, 3);
    }

    #[test]
    fn test_snapshot_import_validates_shape() {
        assert!(Snapshot::from_import(&json!({"habits": [], "completions": {}})).is_ok());
        assert!(Snapshot::from_import(&json!({"habits": [], "completions": []})).is_err());
        assert!(Snapshot::from_import(&json!({"completions": {}})).is_err());
    }
}
