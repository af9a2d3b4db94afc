/// SQLite implementation of the habit storage interface
///
/// Habits live in `habits`, completion records in `completions` with the
/// day list kept as JSON text. Every operation that touches more than one
/// row runs inside a transaction.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::{Map, Value};

use crate::analytics::completion_sets::stored_days;
use crate::domain::{CompletionRecord, DateKey, Habit, HabitId, Snapshot};
use crate::storage::{migrations, HabitStorage, StorageError};

const HABIT_COLUMNS: &str =
    "id, name, description, created_at, color, icon, frequency_per_day";

/// SQLite-based storage implementation
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open the database file and bring its schema up to date
    pub fn new(db_path: PathBuf) -> Result<Self, StorageError> {
        let conn = Connection::open(&db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        let storage = Self::with_connection(conn)?;
        tracing::info!("SQLite storage initialized at: {:?}", db_path);
        Ok(storage)
    }

    /// Storage backed by a private in-memory database
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        migrations::initialize_database(&conn)?;
        Ok(Self { conn })
    }

    fn row_to_habit(row: &Row<'_>) -> rusqlite::Result<Habit> {
        let created_at_str: String = row.get(3)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|_| {
                rusqlite::Error::InvalidColumnType(3, "Invalid datetime".to_string(), rusqlite::types::Type::Text)
            })?
            .with_timezone(&Utc);

        Ok(Habit::from_existing(
            HabitId(row.get(0)?),
            row.get(1)?, // name
            row.get(2)?, // description
            created_at,
            row.get(4)?, // color
            row.get(5)?, // icon
            row.get(6)?, // frequency_per_day
        ))
    }

    fn habit_exists(conn: &Connection, habit_id: &HabitId) -> Result<bool, StorageError> {
        let found = conn
            .query_row("SELECT 1 FROM habits WHERE id = ?1", params![habit_id.as_str()], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn require_habit(conn: &Connection, habit_id: &HabitId) -> Result<(), StorageError> {
        if Self::habit_exists(conn, habit_id)? {
            Ok(())
        } else {
            Err(StorageError::HabitNotFound { habit_id: habit_id.to_string() })
        }
    }

    /// Stored day list for one habit, `None` when there is no record
    fn raw_dates(conn: &Connection, habit_id: &HabitId) -> Result<Option<Value>, StorageError> {
        let text: Option<String> = conn
            .query_row(
                "SELECT dates FROM completions WHERE habit_id = ?1",
                params![habit_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(text.map(|t| parse_dates(habit_id.as_str(), &t)))
    }

    fn write_dates(conn: &Connection, habit_id: &HabitId, dates: &[DateKey]) -> Result<(), StorageError> {
        let json = serde_json::to_string(dates)?;
        conn.execute(
            "INSERT INTO completions (habit_id, dates) VALUES (?1, ?2)
             ON CONFLICT(habit_id) DO UPDATE SET dates = excluded.dates",
            params![habit_id.as_str(), json],
        )?;
        Ok(())
    }

    fn upsert_habit(conn: &Connection, habit: &Habit) -> Result<(), StorageError> {
        conn.execute(
            "INSERT INTO habits (id, name, description, created_at, color, icon, frequency_per_day)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                created_at = excluded.created_at,
                color = excluded.color,
                icon = excluded.icon,
                frequency_per_day = excluded.frequency_per_day",
            params![
                habit.id.as_str(),
                habit.name,
                habit.description,
                habit.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                habit.color,
                habit.icon,
                habit.frequency_per_day,
            ],
        )?;
        Ok(())
    }

    fn replace_habits_in(conn: &Connection, habits: &[Habit]) -> Result<(), StorageError> {
        let keep: HashSet<&str> = habits.iter().map(|h| h.id.as_str()).collect();

        for habit in habits {
            habit.validate()?;
            Self::upsert_habit(conn, habit)?;
            conn.execute(
                "INSERT OR IGNORE INTO completions (habit_id, dates) VALUES (?1, '[]')",
                params![habit.id.as_str()],
            )?;
        }

        let existing = Self::ids(conn, "SELECT id FROM habits")?;
        for stale in existing.iter().filter(|id| !keep.contains(id.as_str())) {
            conn.execute("DELETE FROM habits WHERE id = ?1", params![stale])?;
        }

        // Records left behind by habits that no longer exist
        let records = Self::ids(conn, "SELECT habit_id FROM completions")?;
        for orphan in records.iter().filter(|id| !keep.contains(id.as_str())) {
            conn.execute("DELETE FROM completions WHERE habit_id = ?1", params![orphan])?;
        }

        Ok(())
    }

    fn replace_completions_in(
        conn: &Connection,
        completions: &BTreeMap<HabitId, Vec<DateKey>>,
    ) -> Result<(), StorageError> {
        for (habit_id, dates) in completions {
            let unique: Vec<DateKey> = dates.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
            Self::write_dates(conn, habit_id, &unique)?;
        }

        let records = Self::ids(conn, "SELECT habit_id FROM completions")?;
        for stale in records.iter().filter(|id| !completions.contains_key(id.as_str())) {
            conn.execute("DELETE FROM completions WHERE habit_id = ?1", params![stale])?;
        }

        Ok(())
    }

    fn ids(conn: &Connection, sql: &str) -> Result<Vec<String>, StorageError> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut ids = Vec::new();
        for id in rows {
            ids.push(id?);
        }
        Ok(ids)
    }
}

/// Parse a stored day list, tolerating text that is not valid JSON
fn parse_dates(habit_id: &str, text: &str) -> Value {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Unreadable completion record for habit {}: {}", habit_id, e);
            Value::Array(Vec::new())
        }
    }
}

impl HabitStorage for SqliteStorage {
    fn load_habits(&self) -> Result<Vec<Habit>, StorageError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM habits ORDER BY rowid", HABIT_COLUMNS))?;
        let habit_iter = stmt.query_map([], Self::row_to_habit)?;

        let mut habits = Vec::new();
        for habit in habit_iter {
            habits.push(habit?);
        }
        Ok(habits)
    }

    fn load_completions(&self) -> Result<Value, StorageError> {
        let mut stmt = self.conn.prepare("SELECT habit_id, dates FROM completions ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut map = Map::new();
        for row in rows {
            let (habit_id, text) = row?;
            let dates = parse_dates(&habit_id, &text);
            map.insert(habit_id, dates);
        }
        Ok(Value::Object(map))
    }

    fn replace_habits(&self, habits: &[Habit]) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        Self::replace_habits_in(&tx, habits)?;
        tx.commit()?;
        tracing::debug!("Replaced habit collection with {} habits", habits.len());
        Ok(())
    }

    fn replace_completions(
        &self,
        completions: &BTreeMap<HabitId, Vec<DateKey>>,
    ) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        Self::replace_completions_in(&tx, completions)?;
        tx.commit()?;
        tracing::debug!("Replaced completion collection with {} records", completions.len());
        Ok(())
    }

    fn create_habit(&self, habit: &Habit) -> Result<(), StorageError> {
        habit.validate()?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            &format!("INSERT INTO habits ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)", HABIT_COLUMNS),
            params![
                habit.id.as_str(),
                habit.name,
                habit.description,
                habit.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                habit.color,
                habit.icon,
                habit.frequency_per_day,
            ],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO completions (habit_id, dates) VALUES (?1, '[]')",
            params![habit.id.as_str()],
        )?;
        tx.commit()?;

        tracing::debug!("Created habit: {} ({})", habit.name, habit.id);
        Ok(())
    }

    fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM habits WHERE id = ?1", HABIT_COLUMNS),
                params![habit_id.as_str()],
                Self::row_to_habit,
            )
            .optional()?
            .ok_or_else(|| StorageError::HabitNotFound { habit_id: habit_id.to_string() })
    }

    fn update_habit(&self, habit: &Habit) -> Result<(), StorageError> {
        habit.validate()?;
        let rows_affected = self.conn.execute(
            "UPDATE habits SET name = ?2, description = ?3 WHERE id = ?1",
            params![habit.id.as_str(), habit.name, habit.description],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound { habit_id: habit.id.to_string() });
        }

        tracing::debug!("Updated habit: {} ({})", habit.name, habit.id);
        Ok(())
    }

    fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        let rows_affected = tx.execute("DELETE FROM habits WHERE id = ?1", params![habit_id.as_str()])?;
        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound { habit_id: habit_id.to_string() });
        }
        tx.execute("DELETE FROM completions WHERE habit_id = ?1", params![habit_id.as_str()])?;
        tx.commit()?;

        tracing::debug!("Deleted habit and its completions: {}", habit_id);
        Ok(())
    }

    fn completion_dates(&self, habit_id: &HabitId) -> Result<CompletionRecord, StorageError> {
        Self::require_habit(&self.conn, habit_id)?;
        let dates = Self::raw_dates(&self.conn, habit_id)?
            .map(|value| stored_days(&value))
            .unwrap_or_default();
        Ok(CompletionRecord::with_dates(habit_id.clone(), dates))
    }

    fn set_completion_dates(&self, habit_id: &HabitId, dates: &[DateKey]) -> Result<(), StorageError> {
        Self::require_habit(&self.conn, habit_id)?;
        let unique: Vec<DateKey> = dates.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        Self::write_dates(&self.conn, habit_id, &unique)?;
        tracing::debug!("Set {} completion dates for habit {}", unique.len(), habit_id);
        Ok(())
    }

    fn toggle_completion(&self, habit_id: &HabitId, day: DateKey) -> Result<bool, StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        Self::require_habit(&tx, habit_id)?;

        // Legacy object entries are rewritten as plain keys, never dropped
        let dates = Self::raw_dates(&tx, habit_id)?
            .map(|value| stored_days(&value))
            .unwrap_or_default();
        let mut record = CompletionRecord::with_dates(habit_id.clone(), dates);
        let completed = record.toggle(day);
        Self::write_dates(&tx, habit_id, &record.to_vec())?;
        tx.commit()?;

        tracing::debug!("Toggled {} for habit {}: completed={}", day, habit_id, completed);
        Ok(completed)
    }

    /// Replace everything in a single transaction
    ///
    /// Completion lists naming habits absent from the snapshot are skipped.
    fn import_snapshot(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let known: HashSet<&HabitId> = snapshot.habits.iter().map(|h| &h.id).collect();
        let mut completions: BTreeMap<HabitId, Vec<DateKey>> = snapshot
            .completions
            .iter()
            .filter(|(id, _)| known.contains(id))
            .map(|(id, dates)| (id.clone(), dates.clone()))
            .collect();
        for habit in &snapshot.habits {
            completions.entry(habit.id.clone()).or_default();
        }

        let tx = self.conn.unchecked_transaction()?;
        Self::replace_habits_in(&tx, &snapshot.habits)?;
        Self::replace_completions_in(&tx, &completions)?;
        tx.commit()?;

        tracing::info!(
            "Imported snapshot: {} habits, {} completion records",
            snapshot.habits.len(),
            completions.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn habit(name: &str) -> Habit {
        Habit::new(name.to_string(), None, None, None, None).unwrap()
    }

    fn day(s: &str) -> DateKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_create_and_get_habit() {
        let storage = SqliteStorage::in_memory().unwrap();
        let habit = habit("Read");
        storage.create_habit(&habit).unwrap();

        let loaded = storage.get_habit(&habit.id).unwrap();
        assert_eq!(loaded.name, "Read");
        assert_eq!(loaded.created_at.timestamp_millis(), habit.created_at.timestamp_millis());
        assert_eq!(storage.load_completions().unwrap(), json!({ habit.id.as_str(): [] }));
    }

    #[test]
    fn test_get_missing_habit() {
        let storage = SqliteStorage::in_memory().unwrap();
        let result = storage.get_habit(&HabitId("nope".to_string()));
        assert!(matches!(result, Err(StorageError::HabitNotFound { .. })));
    }

    #[test]
    fn test_update_only_touches_name_and_description() {
        let storage = SqliteStorage::in_memory().unwrap();
        let mut habit = Habit::new("Run".into(), None, Some("red".into()), None, Some(2)).unwrap();
        storage.create_habit(&habit).unwrap();

        habit.update(Some("Run 5k".into()), Some("outside".into())).unwrap();
        habit.frequency_per_day = 5;
        storage.update_habit(&habit).unwrap();

        let loaded = storage.get_habit(&habit.id).unwrap();
        assert_eq!(loaded.name, "Run 5k");
        assert_eq!(loaded.description, "outside");
        assert_eq!(loaded.frequency_per_day, 2);
        assert_eq!(loaded.color, "red");
    }

    #[test]
    fn test_toggle_completion() {
        let storage = SqliteStorage::in_memory().unwrap();
        let habit = habit("Meditate");
        storage.create_habit(&habit).unwrap();

        assert!(storage.toggle_completion(&habit.id, day("2024-05-01")).unwrap());
        assert!(storage.toggle_completion(&habit.id, day("2024-05-02")).unwrap());
        assert!(!storage.toggle_completion(&habit.id, day("2024-05-01")).unwrap());

        let record = storage.completion_dates(&habit.id).unwrap();
        assert_eq!(record.to_vec(), vec![day("2024-05-02")]);

        let missing = storage.toggle_completion(&HabitId("ghost".into()), day("2024-05-01"));
        assert!(matches!(missing, Err(StorageError::HabitNotFound { .. })));
    }

    #[test]
    fn test_toggle_normalizes_legacy_record() {
        let storage = SqliteStorage::in_memory().unwrap();
        let habit = habit("Walk");
        storage.create_habit(&habit).unwrap();
        storage
            .conn
            .execute(
                "UPDATE completions SET dates = ?2 WHERE habit_id = ?1",
                params![habit.id.as_str(), r#"["2024-05-01", "2024-05-01", "garbage"]"#],
            )
            .unwrap();

        assert!(storage.toggle_completion(&habit.id, day("2024-05-03")).unwrap());
        let raw = storage.load_completions().unwrap();
        assert_eq!(raw[habit.id.as_str()], json!(["2024-05-01", "2024-05-03"]));
    }

    #[test]
    fn test_toggle_keeps_legacy_object_entries() {
        let storage = SqliteStorage::in_memory().unwrap();
        let habit = habit("Journal");
        storage.create_habit(&habit).unwrap();
        storage
            .conn
            .execute(
                "UPDATE completions SET dates = ?2 WHERE habit_id = ?1",
                params![habit.id.as_str(), r#"[{"date": "2024-05-01"}, {"completedAt": "2024-05-02"}]"#],
            )
            .unwrap();

        let record = storage.completion_dates(&habit.id).unwrap();
        assert!(record.is_completed_on(&day("2024-05-01")));
        assert!(record.is_completed_on(&day("2024-05-02")));

        let exported = storage.export_snapshot(Utc::now()).unwrap();
        assert_eq!(exported.completions[&habit.id], vec![day("2024-05-01"), day("2024-05-02")]);

        assert!(storage.toggle_completion(&habit.id, day("2024-05-03")).unwrap());
        let raw = storage.load_completions().unwrap();
        assert_eq!(raw[habit.id.as_str()], json!(["2024-05-01", "2024-05-02", "2024-05-03"]));
    }

    #[test]
    fn test_unreadable_record_loads_as_empty() {
        let storage = SqliteStorage::in_memory().unwrap();
        let habit = habit("Stretch");
        storage.create_habit(&habit).unwrap();
        storage
            .conn
            .execute("UPDATE completions SET dates = 'not json' WHERE habit_id = ?1", params![habit.id.as_str()])
            .unwrap();

        assert_eq!(storage.load_completions().unwrap()[habit.id.as_str()], json!([]));
        assert!(storage.completion_dates(&habit.id).unwrap().dates.is_empty());
    }

    #[test]
    fn test_delete_cascades() {
        let storage = SqliteStorage::in_memory().unwrap();
        let keep = habit("Keep");
        let gone = habit("Gone");
        storage.create_habit(&keep).unwrap();
        storage.create_habit(&gone).unwrap();
        storage.toggle_completion(&gone.id, day("2024-05-01")).unwrap();

        storage.delete_habit(&gone.id).unwrap();

        let habits = storage.load_habits().unwrap();
        assert_eq!(habits.len(), 1);
        assert_eq!(habits[0].id, keep.id);
        assert!(storage.load_completions().unwrap().get(gone.id.as_str()).is_none());
        assert!(matches!(storage.delete_habit(&gone.id), Err(StorageError::HabitNotFound { .. })));
    }

    #[test]
    fn test_replace_habits_removes_missing_and_their_records() {
        let storage = SqliteStorage::in_memory().unwrap();
        let a = habit("A");
        let b = habit("B");
        storage.create_habit(&a).unwrap();
        storage.create_habit(&b).unwrap();
        storage.toggle_completion(&b.id, day("2024-05-01")).unwrap();

        let mut renamed = a.clone();
        renamed.name = "A2".to_string();
        let c = habit("C");
        storage.replace_habits(&[renamed, c.clone()]).unwrap();

        let names: Vec<String> = storage.load_habits().unwrap().into_iter().map(|h| h.name).collect();
        assert_eq!(names, vec!["A2", "C"]);

        let raw = storage.load_completions().unwrap();
        let ids: Vec<&String> = raw.as_object().unwrap().keys().collect();
        assert_eq!(ids.len(), 2);
        assert!(raw.get(b.id.as_str()).is_none());
        assert_eq!(raw[c.id.as_str()], json!([]));
    }

    #[test]
    fn test_replace_completions() {
        let storage = SqliteStorage::in_memory().unwrap();
        let a = habit("A");
        let b = habit("B");
        storage.create_habit(&a).unwrap();
        storage.create_habit(&b).unwrap();

        let mut map = BTreeMap::new();
        map.insert(a.id.clone(), vec![day("2024-05-02"), day("2024-05-01"), day("2024-05-02")]);
        storage.replace_completions(&map).unwrap();

        let raw = storage.load_completions().unwrap();
        assert_eq!(raw[a.id.as_str()], json!(["2024-05-01", "2024-05-02"]));
        assert!(raw.get(b.id.as_str()).is_none());
        // A habit whose record was removed reads as having no completions
        assert!(storage.completion_dates(&b.id).unwrap().dates.is_empty());
    }

    #[test]
    fn test_export_import_round_trip() {
        let source = SqliteStorage::in_memory().unwrap();
        let journal = habit("Journal");
        source.create_habit(&journal).unwrap();
        source.toggle_completion(&journal.id, day("2024-05-01")).unwrap();

        let now = Utc::now();
        let snapshot = source.export_snapshot(now).unwrap();
        assert_eq!(snapshot.version, "1.0");

        let target = SqliteStorage::in_memory().unwrap();
        target.create_habit(&habit("Old")).unwrap();
        target.import_snapshot(&snapshot).unwrap();

        assert_eq!(target.export_snapshot(now).unwrap(), snapshot);
    }

    #[test]
    fn test_import_skips_completions_without_habit() {
        let storage = SqliteStorage::in_memory().unwrap();
        let only = habit("Only");
        let mut completions = BTreeMap::new();
        completions.insert(HabitId("stranger".into()), vec![day("2024-05-01")]);
        let snapshot = Snapshot::new(vec![only.clone()], completions, Utc::now());

        storage.import_snapshot(&snapshot).unwrap();
        let raw = storage.load_completions().unwrap();
        assert!(raw.get("stranger").is_none());
        assert_eq!(raw[only.id.as_str()], json!([]));
    }
}
