/// Storage layer for persisting habit data
///
/// The repository only needs two things from a backend: load the whole
/// collection once at startup and save it after every mutation. SQLite is the
/// durable backend; the in-memory store backs tests and ephemeral sessions.

pub mod memory;
pub mod sqlite;
pub mod migrations;

// Re-export the main storage types
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use thiserror::Error;
use crate::domain::Habit;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Stored habit {habit_id} is inconsistent: {reason}")]
    Corrupt { habit_id: String, reason: String },

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Trait defining the persistence boundary for habits
///
/// This trait allows the repository to be tested against an in-memory fake
/// while the server uses SQLite, without either knowing about the other.
pub trait HabitStorage {
    /// Load every stored habit, active or not
    fn load(&self) -> Result<Vec<Habit>, StorageError>;

    /// Replace the stored collection with `habits`
    fn save(&self, habits: &[Habit]) -> Result<(), StorageError>;
}
