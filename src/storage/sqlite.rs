/// SQLite implementation of the habit storage interface
///
/// This module provides the durable backend used by the server. Habits are
/// stored one row each with the full record as a JSON document.

use std::path::Path;

use rusqlite::{params, Connection};

use crate::domain::{Habit, HabitKind};
use crate::storage::{migrations, HabitStorage, StorageError};

/// SQLite-based storage implementation
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open (or create) the database file and bring its schema up to date
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        migrations::initialize_database(&conn)?;

        tracing::info!("SQLite storage initialized at: {:?}", db_path);
        Ok(Self { conn })
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;
        migrations::initialize_database(&conn)?;
        Ok(Self { conn })
    }

    fn row_to_habit(id: String, habit_type: String, document: String) -> Result<Habit, StorageError> {
        let habit: Habit = serde_json::from_str(&document)?;

        // The column and the embedded tag are written together; a mismatch
        // means the row was edited by hand.
        if habit.kind.label() != habit_type {
            return Err(StorageError::Corrupt {
                habit_id: id,
                reason: format!(
                    "habit_type column says '{}' but document says '{}'",
                    habit_type,
                    habit.kind.label()
                ),
            });
        }

        Ok(habit)
    }
}

impl HabitStorage for SqliteStorage {
    fn load(&self) -> Result<Vec<Habit>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, habit_type, document FROM habits ORDER BY created_at ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut habits = Vec::new();
        for row in rows {
            let (id, habit_type, document) = row?;
            habits.push(Self::row_to_habit(id, habit_type, document)?);
        }

        tracing::debug!("Loaded {} habits from SQLite", habits.len());
        Ok(habits)
    }

    fn save(&self, habits: &[Habit]) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute("DELETE FROM habits", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO habits (
                    id, habit_type, action, group_code, is_active, document, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;

            for habit in habits {
                let group_code = match &habit.kind {
                    HabitKind::Group(state) => Some(state.group_id.to_string()),
                    HabitKind::Solo => None,
                };
                let document = serde_json::to_string(habit)?;

                insert.execute(params![
                    habit.id.to_string(),
                    habit.kind.label(),
                    habit.action,
                    group_code,
                    habit.is_active,
                    document,
                    habit.created_at.to_rfc3339(),
                    habit.updated_at.to_rfc3339(),
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Saved {} habits to SQLite", habits.len());
        Ok(())
    }
}
