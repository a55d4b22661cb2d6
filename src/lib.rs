/// Public library interface for the group habit tracker
///
/// Exports the habit domain (solo and group habits, streaks, weekly
/// progress), the repository with its persistence and notification hooks,
/// the duration estimator, the advisory boundary, and the MCP server that
/// wraps all of it.

use std::path::PathBuf;
use thiserror::Error;

pub mod advisory;
pub mod domain;
pub mod estimator;
pub mod notify;
pub mod repository;
pub mod storage;
pub mod tools;
mod mcp;

pub use domain::*;
pub use estimator::{estimate, ContextStability, Difficulty, DurationEstimate, WhyType};
pub use notify::{HabitEvent, NotificationSink, NotifyError, TracingSink};
pub use repository::{HabitRepository, RepositoryConfig, RepositoryError, MAX_ACTIVE_HABITS};
pub use storage::{HabitStorage, MemoryStorage, SqliteStorage, StorageError};

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] StorageError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Habit tracker backed by a SQLite database and served over MCP
pub struct HabitTrackerServer {
    repository: HabitRepository<SqliteStorage>,
}

impl HabitTrackerServer {
    /// Open (or create) the database at `db_path` and load every habit
    pub fn new(db_path: PathBuf, config: RepositoryConfig) -> Result<Self, ServerError> {
        tracing::info!("Initializing habit tracker with database: {:?}", db_path);

        let storage = SqliteStorage::new(db_path)?;
        let repository = HabitRepository::new(storage, config)?;

        Ok(Self { repository })
    }

    /// Run the MCP server, handling JSON-RPC requests over stdin/stdout
    ///
    /// Blocks until stdin closes or an I/O error occurs.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!(
            "Server started, {} habits loaded ({} active)",
            self.repository.get_all_habits().len(),
            self.repository.active_count()
        );

        let mut mcp_server = mcp::McpServer::new(self);
        mcp_server.run().await?;

        Ok(())
    }

    pub fn repository(&self) -> &HabitRepository<SqliteStorage> {
        &self.repository
    }

    pub fn repository_mut(&mut self) -> &mut HabitRepository<SqliteStorage> {
        &mut self.repository
    }
}
