/// Tool for marking solo habits complete
///
/// This module implements the habit_complete MCP tool. Group habits are
/// completed through member check-ins instead (see `group_checkin`).

use serde::{Deserialize, Serialize};
use schemars::JsonSchema;

use crate::repository::HabitRepository;
use crate::storage::HabitStorage;
use crate::tools::{parse_habit_id, ToolError};

/// Parameters for completing a habit today
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CompleteHabitParams {
    /// ID of the solo habit
    pub habit_id: String,
    /// Remove today's completion instead of adding it
    #[serde(default)]
    pub undo: bool,
}

/// Response from completing a habit
#[derive(Debug, Serialize)]
pub struct CompleteHabitResponse {
    pub success: bool,
    pub message: String,
    pub current_streak: Option<u32>,
}

/// Mark (or unmark) today on a solo habit
pub fn complete_habit<S: HabitStorage>(
    repository: &mut HabitRepository<S>,
    params: CompleteHabitParams,
) -> Result<CompleteHabitResponse, ToolError> {
    let habit_id = parse_habit_id(&params.habit_id)?;

    let habit = repository
        .get_habit(&habit_id)
        .ok_or_else(|| ToolError::HabitNotFound(params.habit_id.clone()))?;
    if habit.is_group() {
        return Err(ToolError::InvalidInput(
            "Group habits are completed by member check-ins; use group_checkin".to_string(),
        ));
    }

    let changed = if params.undo {
        repository.unmark_completed(&habit_id)?
    } else {
        repository.mark_completed(&habit_id)?
    };

    let streak = repository.get_habit(&habit_id).map(|h| h.current_streak);
    let streak_days = streak.unwrap_or(0);

    let message = match (params.undo, changed) {
        (false, true) => format!(
            "Logged today's completion! Current streak: {} day{}",
            streak_days,
            if streak_days == 1 { "" } else { "s" }
        ),
        (false, false) => "Already completed today.".to_string(),
        (true, true) => "Removed today's completion.".to_string(),
        (true, false) => "Today was not marked complete.".to_string(),
    };

    Ok(CompleteHabitResponse {
        success: changed,
        message,
        current_streak: streak,
    })
}
