/// MCP tools for habit management
///
/// This module contains all the MCP tools that external clients can call to
/// interact with the habit repository and the duration estimator.

pub mod create;
pub mod complete;
pub mod group;
pub mod status;
pub mod update;
pub mod estimate;

// Re-export tool functions for easy access
pub use create::*;
pub use complete::*;
pub use group::*;
pub use status::*;
pub use update::*;
pub use estimate::*;

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{parse_day, HabitId};
use crate::repository::RepositoryError;

/// Errors a tool reports back to the client
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Habit not found: {0}")]
    HabitNotFound(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub(crate) fn parse_habit_id(raw: &str) -> Result<HabitId, ToolError> {
    if raw.trim().is_empty() {
        return Err(ToolError::InvalidInput("habit_id cannot be empty".to_string()));
    }
    HabitId::from_string(raw)
        .map_err(|_| ToolError::InvalidInput(format!("'{}' is not a valid habit ID", raw)))
}

pub(crate) fn parse_optional_day(raw: Option<&str>) -> Result<Option<NaiveDate>, ToolError> {
    raw.map(|s| parse_day(s).map_err(|e| ToolError::InvalidInput(e.to_string())))
        .transpose()
}
