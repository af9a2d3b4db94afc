/// Storage and analytics against a real database file
use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, TimeZone, Utc};
use habitflow::*;
use serde_json::json;
use tempfile::NamedTempFile;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn habit_created_on(name: &str, created: &str) -> Habit {
    let mut habit = Habit::new(name.to_string(), None, None, None, None).unwrap();
    habit.created_at = Local
        .from_local_datetime(&date(created).and_hms_opt(12, 0, 0).unwrap())
        .single()
        .unwrap()
        .with_timezone(&Utc);
    habit
}

#[cfg(test)]
mod basic_integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_database_persistence() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let db_path = temp_file.path().to_path_buf();

        let habit = Habit::new("Persist".to_string(), None, None, None, None).unwrap();
        {
            let server = HabitFlowServer::new(db_path.clone(), AnalyticsConfig::default())
                .await
                .expect("Failed to create first server");
            server.storage().create_habit(&habit).unwrap();
            server
                .storage()
                .toggle_completion(&habit.id, DateKey::from_ymd(2024, 5, 1).unwrap())
                .unwrap();
        }

        let server = HabitFlowServer::new(db_path, AnalyticsConfig::default())
            .await
            .expect("Failed to create second server");
        let habits = server.storage().load_habits().unwrap();
        assert_eq!(habits.len(), 1);
        assert_eq!(habits[0].name, "Persist");
        assert_eq!(
            server.storage().load_completions().unwrap(),
            json!({ habit.id.as_str(): ["2024-05-01"] })
        );
    }

    #[test]
    fn test_storage_interface() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let storage = SqliteStorage::new(temp_file.path().to_path_buf())
            .expect("Failed to create storage");

        let dyn_storage: &dyn HabitStorage = &storage;
        assert!(dyn_storage.load_habits().unwrap().is_empty());
        assert_eq!(dyn_storage.load_completions().unwrap(), json!({}));
    }

    #[test]
    fn test_delete_removes_habit_and_completions() {
        let temp_file = NamedTempFile::new().unwrap();
        let storage = SqliteStorage::new(temp_file.path().to_path_buf()).unwrap();
        let keep = Habit::new("Keep".to_string(), None, None, None, None).unwrap();
        let drop = Habit::new("Drop".to_string(), None, None, None, None).unwrap();
        storage.create_habit(&keep).unwrap();
        storage.create_habit(&drop).unwrap();
        storage.toggle_completion(&drop.id, DateKey::from_ymd(2024, 5, 1).unwrap()).unwrap();

        storage.delete_habit(&drop.id).unwrap();

        assert!(matches!(storage.get_habit(&drop.id), Err(StorageError::HabitNotFound { .. })));
        let raw = storage.load_completions().unwrap();
        assert!(raw.get(drop.id.as_str()).is_none());
        assert!(raw.get(keep.id.as_str()).is_some());
    }

    #[test]
    fn test_replace_cycle_leaves_no_orphans() {
        let temp_file = NamedTempFile::new().unwrap();
        let storage = SqliteStorage::new(temp_file.path().to_path_buf()).unwrap();
        let a = Habit::new("A".to_string(), None, None, None, None).unwrap();
        let b = Habit::new("B".to_string(), None, None, None, None).unwrap();
        storage.replace_habits(&[a.clone(), b.clone()]).unwrap();

        let mut completions = BTreeMap::new();
        completions.insert(a.id.clone(), vec![DateKey::from_ymd(2024, 5, 1).unwrap()]);
        completions.insert(b.id.clone(), vec![DateKey::from_ymd(2024, 5, 2).unwrap()]);
        storage.replace_completions(&completions).unwrap();

        storage.replace_habits(&[a.clone()]).unwrap();

        let raw = storage.load_completions().unwrap();
        assert_eq!(raw, json!({ a.id.as_str(): ["2024-05-01"] }));
    }

    #[test]
    fn test_end_to_end_streak_and_rates() {
        let temp_file = NamedTempFile::new().unwrap();
        let storage = SqliteStorage::new(temp_file.path().to_path_buf()).unwrap();
        let habit = habit_created_on("Run", "2024-03-10");
        storage.create_habit(&habit).unwrap();
        for day in ["2024-03-10", "2024-03-11", "2024-03-13"] {
            storage.toggle_completion(&habit.id, day.parse().unwrap()).unwrap();
        }

        let engine = AnalyticsEngine::new(AnalyticsConfig::default());
        let habits = storage.load_habits().unwrap();
        let raw = storage.load_completions().unwrap();
        let dashboard = engine.dashboard(&habits, &raw, date("2024-03-14"));

        assert_eq!(dashboard.streaks[0].current_streak, 1);
        assert_eq!(dashboard.longest_current_streak, 1);
        assert_eq!(dashboard.active_habits, 1);
        assert_eq!(dashboard.today.completed, 0);
        assert_eq!(dashboard.top_habits[0].rate, 60);
        // 3 completions over 31 days for 1 habit
        assert_eq!(dashboard.monthly.total_completed, 3);
        assert_eq!(dashboard.monthly.percent, 10);
    }

    #[test]
    fn test_legacy_records_feed_analytics() {
        let temp_file = NamedTempFile::new().unwrap();
        let storage = SqliteStorage::new(temp_file.path().to_path_buf()).unwrap();
        let habit = habit_created_on("Legacy", "2024-03-01");
        let mut snapshot_completions = BTreeMap::new();
        snapshot_completions.insert(habit.id.clone(), vec![DateKey::from_ymd(2024, 3, 2).unwrap()]);
        storage
            .import_snapshot(&Snapshot::new(vec![habit.clone()], snapshot_completions, Utc::now()))
            .unwrap();

        let record = storage.completion_dates(&habit.id).unwrap();
        assert!(record.is_completed_on(&DateKey::from_ymd(2024, 3, 2).unwrap()));

        let exported = storage.export_snapshot(Utc::now()).unwrap();
        assert_eq!(exported.habits.len(), 1);
        assert_eq!(exported.completions[&habit.id].len(), 1);
    }
}
