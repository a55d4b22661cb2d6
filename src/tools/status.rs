/// Tool for checking habit status and streaks
///
/// This module implements the habit_status MCP tool.

use serde::{Deserialize, Serialize};
use schemars::JsonSchema;

use crate::domain::{day_key, Habit};
use crate::repository::{HabitRepository, HabitStats};
use crate::storage::HabitStorage;
use crate::tools::{parse_habit_id, ToolError};

/// Parameters for checking habit status
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct StatusParams {
    /// Habit to report on; all habits when omitted
    #[serde(default)]
    pub habit_id: Option<String>,
    /// Include soft-deleted habits in the listing
    #[serde(default)]
    pub include_inactive: bool,
}

/// Today's check-in picture for a group habit
#[derive(Debug, Serialize)]
pub struct GroupStatus {
    pub group_code: String,
    pub members: Vec<String>,
    pub checked_in_today: Vec<String>,
    pub waiting_on: Vec<String>,
    pub failed_days: usize,
}

/// Information about a single habit's status
#[derive(Debug, Serialize)]
pub struct HabitStatus {
    pub habit_id: String,
    pub is_active: bool,
    pub last_completed: Option<String>,
    #[serde(flatten)]
    pub stats: HabitStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupStatus>,
}

/// Response from checking habit status
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub habits: Vec<HabitStatus>,
    pub active_count: usize,
    pub max_active_habits: usize,
    pub message: String,
}

pub fn get_habit_status<S: HabitStorage>(
    repository: &HabitRepository<S>,
    params: StatusParams,
) -> Result<StatusResponse, ToolError> {
    let habits: Vec<&Habit> = match params.habit_id.as_deref() {
        Some(raw) => {
            let habit_id = parse_habit_id(raw)?;
            let habit = repository
                .get_habit(&habit_id)
                .ok_or_else(|| ToolError::HabitNotFound(raw.to_string()))?;
            vec![habit]
        }
        None => repository
            .get_all_habits()
            .iter()
            .filter(|h| params.include_inactive || h.is_active)
            .collect(),
    };

    let statuses: Vec<HabitStatus> = habits
        .into_iter()
        .filter_map(|habit| describe(repository, habit))
        .collect();

    let message = if statuses.is_empty() {
        "No habits yet. Create one to get started!".to_string()
    } else {
        let on_streak = statuses.iter().filter(|s| s.stats.streak_alive).count();
        format!(
            "{} habit{} shown, {} with a live streak",
            statuses.len(),
            if statuses.len() == 1 { "" } else { "s" },
            on_streak
        )
    };

    Ok(StatusResponse {
        habits: statuses,
        active_count: repository.active_count(),
        max_active_habits: repository.config().max_active_habits,
        message,
    })
}

fn describe<S: HabitStorage>(repository: &HabitRepository<S>, habit: &Habit) -> Option<HabitStatus> {
    let stats = repository.get_stats(&habit.id)?;
    let today = repository.today();

    let group = habit.group().map(|g| {
        let status = g.check_in_status(today);
        GroupStatus {
            group_code: g.group_id.to_string(),
            members: g.members.iter().map(|m| m.to_string()).collect(),
            checked_in_today: status.checked_in.iter().map(|m| m.to_string()).collect(),
            waiting_on: status.waiting_on.iter().map(|m| m.to_string()).collect(),
            failed_days: g.failed_days.len(),
        }
    });

    Some(HabitStatus {
        habit_id: habit.id.to_string(),
        is_active: habit.is_active,
        last_completed: habit.completed_days.iter().next_back().map(|d| day_key(*d)),
        stats,
        group,
    })
}
