/// Tools for group habits
///
/// Joining by invite code, per-member check-ins, membership changes and the
/// end-of-day finalization a scheduler (or the client) triggers.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use schemars::JsonSchema;

use crate::domain::{day_key, CheckInOutcome, FinalizeOutcome, MemberId};
use crate::repository::HabitRepository;
use crate::storage::HabitStorage;
use crate::tools::{parse_habit_id, parse_optional_day, ToolError};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct JoinGroupParams {
    /// Invite code shared by a group member
    pub code: String,
    /// Your member identifier (phone number)
    pub member: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CheckInParams {
    /// ID of the group habit
    pub habit_id: String,
    /// Member checking in
    pub member: String,
    /// Day checked in for (YYYY-MM-DD), defaults to today
    #[serde(default)]
    pub day: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MemberChangeParams {
    /// ID of the group habit
    pub habit_id: String,
    /// Member to add or remove
    pub member: String,
    /// Remove the member (and their check-ins) instead of adding
    #[serde(default)]
    pub remove: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FinalizeParams {
    /// Day to finalize (YYYY-MM-DD), defaults to yesterday
    #[serde(default)]
    pub day: Option<String>,
}

/// Generic response for group tools
#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub success: bool,
    pub message: String,
}

pub fn join_group<S: HabitStorage>(
    repository: &mut HabitRepository<S>,
    params: JoinGroupParams,
) -> Result<GroupResponse, ToolError> {
    let member = MemberId::new(params.member.as_str());
    if member.as_str().is_empty() {
        return Err(ToolError::InvalidInput("member cannot be empty".to_string()));
    }

    let response = match repository.join_group_by_code(&params.code, member)? {
        Some(id) => {
            let action = repository.get_habit(&id).map(|h| h.action.clone()).unwrap_or_default();
            GroupResponse {
                success: true,
                message: format!("Joined group habit '{}' ({})", action, id),
            }
        }
        None => GroupResponse {
            success: false,
            message: format!("No active group found for code '{}'", params.code.trim()),
        },
    };
    Ok(response)
}

pub fn check_in<S: HabitStorage>(
    repository: &mut HabitRepository<S>,
    params: CheckInParams,
) -> Result<GroupResponse, ToolError> {
    let habit_id = parse_habit_id(&params.habit_id)?;
    let day = parse_optional_day(params.day.as_deref())?;
    let member = MemberId::new(params.member.as_str());

    let outcome = repository
        .check_in_member(&habit_id, &member, day)?
        .ok_or_else(|| ToolError::HabitNotFound(params.habit_id.clone()))?;

    let day = day.unwrap_or_else(|| repository.today());
    let waiting = repository
        .get_habit(&habit_id)
        .and_then(|h| h.group())
        .map(|g| g.check_in_status(day).waiting_on.len())
        .unwrap_or(0);

    let (success, message) = match outcome {
        CheckInOutcome::Recorded => (
            true,
            format!("{} checked in for {}. Waiting on {} more.", member, day_key(day), waiting),
        ),
        CheckInOutcome::GroupCompleted => (
            true,
            format!("{} checked in. Everyone finished {}!", member, day_key(day)),
        ),
        CheckInOutcome::AlreadyRecorded => (
            false,
            format!("{} already checked in for {}.", member, day_key(day)),
        ),
        CheckInOutcome::DayLocked => (
            false,
            format!("{} was already closed as missed; it can no longer change.", day_key(day)),
        ),
    };

    Ok(GroupResponse { success, message })
}

pub fn change_member<S: HabitStorage>(
    repository: &mut HabitRepository<S>,
    params: MemberChangeParams,
) -> Result<GroupResponse, ToolError> {
    let habit_id = parse_habit_id(&params.habit_id)?;
    if repository.get_habit(&habit_id).is_none() {
        return Err(ToolError::HabitNotFound(params.habit_id.clone()));
    }
    let member = MemberId::new(params.member.as_str());

    let changed = if params.remove {
        repository.remove_member(&habit_id, &member)?
    } else {
        repository.add_member(&habit_id, member.clone())?
    };

    let message = match (params.remove, changed) {
        (false, true) => format!("Added {} to the group.", member),
        (false, false) => format!("{} is already in the group.", member),
        (true, true) => format!("Removed {} from the group.", member),
        (true, false) => format!("{} is not in the group.", member),
    };
    Ok(GroupResponse { success: changed, message })
}

pub fn finalize_groups<S: HabitStorage>(
    repository: &mut HabitRepository<S>,
    params: FinalizeParams,
) -> Result<GroupResponse, ToolError> {
    let day = parse_optional_day(params.day.as_deref())?
        .unwrap_or_else(|| repository.today() - Duration::days(1));

    let outcomes = repository.finalize_group_habits_for_day(day)?;
    let failed = outcomes.iter().filter(|(_, o)| *o == FinalizeOutcome::Failed).count();
    let completed = outcomes.iter().filter(|(_, o)| *o == FinalizeOutcome::Completed).count();

    Ok(GroupResponse {
        success: true,
        message: format!(
            "Finalized {}: {} group habit(s) completed, {} missed, {} already closed.",
            day_key(day),
            completed,
            failed,
            outcomes.len() - failed - completed
        ),
    })
}
