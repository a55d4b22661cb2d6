/// Tools for editing and deleting existing habits
///
/// This module implements the habit_update and habit_delete MCP tools.

use serde::{Deserialize, Serialize};
use schemars::JsonSchema;

use crate::repository::HabitRepository;
use crate::storage::HabitStorage;
use crate::tools::{parse_habit_id, ToolError};

/// Parameters for updating an existing habit
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateHabitParams {
    pub habit_id: String,
    /// New action text
    #[serde(default)]
    pub action: Option<String>,
    /// New goal in days
    #[serde(default)]
    pub goal_days: Option<u32>,
}

/// Parameters for deleting a habit
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteHabitParams {
    pub habit_id: String,
    /// Remove the habit and its history entirely instead of deactivating it
    #[serde(default)]
    pub permanent: bool,
}

/// Response from updating or deleting a habit
#[derive(Debug, Serialize)]
pub struct UpdateHabitResponse {
    pub success: bool,
    pub message: String,
}

pub fn update_habit<S: HabitStorage>(
    repository: &mut HabitRepository<S>,
    params: UpdateHabitParams,
) -> Result<UpdateHabitResponse, ToolError> {
    let habit_id = parse_habit_id(&params.habit_id)?;
    if repository.get_habit(&habit_id).is_none() {
        return Err(ToolError::HabitNotFound(params.habit_id.clone()));
    }

    if let Some(action) = &params.action {
        if action.trim().chars().count() > 100 {
            return Err(ToolError::InvalidInput(
                "Habit action too long (max 100 characters)".to_string(),
            ));
        }
    }

    let changed = repository.update_habit(&habit_id, params.action.as_deref(), params.goal_days)?;

    let message = match (changed, repository.get_habit(&habit_id)) {
        (true, Some(habit)) => format!(
            "Updated habit '{}' (goal: {} days)",
            habit.action, habit.goal_days
        ),
        _ => "Nothing to update.".to_string(),
    };

    Ok(UpdateHabitResponse { success: changed, message })
}

pub fn delete_habit<S: HabitStorage>(
    repository: &mut HabitRepository<S>,
    params: DeleteHabitParams,
) -> Result<UpdateHabitResponse, ToolError> {
    let habit_id = parse_habit_id(&params.habit_id)?;
    let action = repository
        .get_habit(&habit_id)
        .map(|h| h.action.clone())
        .ok_or_else(|| ToolError::HabitNotFound(params.habit_id.clone()))?;

    let removed = if params.permanent {
        repository.remove_habit_permanently(&habit_id)?
    } else {
        repository.delete_habit(&habit_id)?
    };

    let message = if params.permanent {
        format!("Permanently deleted habit '{}'", action)
    } else {
        format!("Deactivated habit '{}'. Its history is kept.", action)
    };

    Ok(UpdateHabitResponse { success: removed, message })
}
