/// Tool for creating new habits
///
/// This module implements the habit_create MCP tool. Passing `members`
/// creates a group habit; omitting it creates a solo habit.

use serde::{Deserialize, Serialize};
use schemars::JsonSchema;

use crate::domain::MemberId;
use crate::repository::HabitRepository;
use crate::storage::HabitStorage;
use crate::tools::ToolError;

/// Parameters for creating a new habit
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateHabitParams {
    /// What you will do, e.g. "Drink a glass of water"
    pub action: String,
    /// How many completed days count as reaching the goal
    pub goal_days: u32,
    /// Member identifiers (phone numbers) for a group habit
    #[serde(default)]
    pub members: Option<Vec<String>>,
}

/// Response from creating a habit
#[derive(Debug, Serialize)]
pub struct CreateHabitResponse {
    pub success: bool,
    pub habit_id: Option<String>,
    pub group_code: Option<String>,
    pub message: String,
}

/// Create a new habit in the repository
pub fn create_habit<S: HabitStorage>(
    repository: &mut HabitRepository<S>,
    params: CreateHabitParams,
) -> Result<CreateHabitResponse, ToolError> {
    let action = params.action.trim();
    if action.is_empty() {
        return Err(ToolError::InvalidInput("Habit action cannot be empty".to_string()));
    }
    if action.chars().count() > 100 {
        return Err(ToolError::InvalidInput(
            "Habit action too long (max 100 characters)".to_string(),
        ));
    }
    if params.goal_days == 0 {
        return Err(ToolError::InvalidInput("goal_days must be at least 1".to_string()));
    }

    let created = match params.members {
        Some(members) => {
            let members = members.iter().map(|m| MemberId::new(m.as_str())).collect();
            repository.create_group_habit(action, params.goal_days, members)?
        }
        None => repository.create_solo_habit(action, params.goal_days)?,
    };

    let Some(habit) = created else {
        return Ok(CreateHabitResponse {
            success: false,
            habit_id: None,
            group_code: None,
            message: format!(
                "You already have {} active habits. Finish or delete one before starting another.",
                repository.config().max_active_habits
            ),
        });
    };

    let group_code = habit.group().map(|g| g.group_id.to_string());
    let message = match &group_code {
        Some(code) => format!(
            "Created group habit '{}' with a {}-day goal. Share code {} to invite others.",
            habit.action, habit.goal_days, code
        ),
        None => format!(
            "Created habit '{}' with a {}-day goal. Ready to start your streak!",
            habit.action, habit.goal_days
        ),
    };

    Ok(CreateHabitResponse {
        success: true,
        habit_id: Some(habit.id.to_string()),
        group_code,
        message,
    })
}
