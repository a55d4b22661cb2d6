/// Habit entity and related functionality
///
/// This module defines the Habit record shared by solo and group habits,
/// together with its completion history and the derived streak and weekly
/// progress fields.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{streak, GroupCode, GroupState, HabitId, MemberId};

/// Solo or group flavour of a habit
///
/// The tag is persisted as `habit_type` and always decides which variant is
/// rebuilt on load, even for a group whose member list is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "habit_type", rename_all = "snake_case")]
pub enum HabitKind {
    /// Tracked by one person, no collaborators
    Solo,
    /// Shared by several members with all-or-nothing day completion
    Group(GroupState),
}

impl HabitKind {
    pub fn label(&self) -> &'static str {
        match self {
            HabitKind::Solo => "solo",
            HabitKind::Group(_) => "group",
        }
    }
}

/// A habit the user is trying to build
///
/// Both variants share this record. `completed_days` is the source of truth;
/// `current_streak` and `days_per_week_done` are recomputed from it whenever
/// it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Unique identifier for this habit
    pub id: HabitId,
    /// What the user does (e.g., "Drink water")
    pub action: String,
    /// Target number of completed days
    pub goal_days: u32,
    /// When this habit was created
    pub created_at: DateTime<Utc>,
    /// Bumped by every mutating operation
    pub updated_at: DateTime<Utc>,
    /// Local calendar days on which the habit was completed
    #[serde(default)]
    pub completed_days: BTreeSet<NaiveDate>,
    /// Derived: run of consecutive days ending at the latest completion
    #[serde(default)]
    pub current_streak: u32,
    /// Derived: completions in the current Monday-starting week
    #[serde(default)]
    pub days_per_week_done: u32,
    /// False once the habit has been soft deleted
    pub is_active: bool,
    #[serde(flatten)]
    pub kind: HabitKind,
}

impl Habit {
    /// Create a new solo habit
    pub fn new_solo(action: impl Into<String>, goal_days: u32) -> Self {
        Self::with_kind(action.into(), goal_days, HabitKind::Solo)
    }

    /// Create a new group habit with a fresh invite code
    pub fn new_group(
        action: impl Into<String>,
        goal_days: u32,
        members: impl IntoIterator<Item = MemberId>,
    ) -> Self {
        Self::new_group_with_code(action, goal_days, members, GroupCode::generate())
    }

    /// Create a new group habit with a caller-chosen invite code
    pub fn new_group_with_code(
        action: impl Into<String>,
        goal_days: u32,
        members: impl IntoIterator<Item = MemberId>,
        group_id: GroupCode,
    ) -> Self {
        let state = GroupState::new(group_id, members);
        Self::with_kind(action.into(), goal_days, HabitKind::Group(state))
    }

    fn with_kind(action: String, goal_days: u32, kind: HabitKind) -> Self {
        let now = Utc::now();
        Self {
            id: HabitId::new(),
            action: action.trim().to_string(),
            goal_days: goal_days.max(1),
            created_at: now,
            updated_at: now,
            completed_days: BTreeSet::new(),
            current_streak: 0,
            days_per_week_done: 0,
            is_active: true,
            kind,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, HabitKind::Group(_))
    }

    pub fn group(&self) -> Option<&GroupState> {
        match &self.kind {
            HabitKind::Group(state) => Some(state),
            HabitKind::Solo => None,
        }
    }

    pub(crate) fn group_mut(&mut self) -> Option<&mut GroupState> {
        match &mut self.kind {
            HabitKind::Group(state) => Some(state),
            HabitKind::Solo => None,
        }
    }

    /// Record a completion for `day`
    ///
    /// Returns false without touching `updated_at` when the day was already
    /// recorded.
    pub fn mark_day_completed(&mut self, day: NaiveDate, today: NaiveDate) -> bool {
        if !self.completed_days.insert(day) {
            return false;
        }
        self.recompute(today);
        self.touch();
        true
    }

    /// Remove a completion for `day`, if there is one
    pub fn unmark_day_completed(&mut self, day: NaiveDate, today: NaiveDate) -> bool {
        if !self.completed_days.remove(&day) {
            return false;
        }
        self.recompute(today);
        self.touch();
        true
    }

    pub fn is_completed_on(&self, day: NaiveDate) -> bool {
        self.completed_days.contains(&day)
    }

    pub fn is_completed_today(&self, today: NaiveDate) -> bool {
        self.is_completed_on(today)
    }

    /// Apply a partial edit
    ///
    /// Only supplied fields are applied. A blank action or a zero goal is
    /// ignored and leaves the field unchanged; callers that need feedback
    /// must validate first. Returns true when anything changed.
    pub fn edit(&mut self, new_action: Option<&str>, new_goal_days: Option<u32>) -> bool {
        let mut changed = false;

        if let Some(action) = new_action.map(str::trim).filter(|a| !a.is_empty()) {
            if action != self.action {
                self.action = action.to_string();
                changed = true;
            }
        }

        if let Some(goal) = new_goal_days.filter(|g| *g > 0) {
            if goal != self.goal_days {
                self.goal_days = goal;
                changed = true;
            }
        }

        if changed {
            self.touch();
        }
        changed
    }

    /// Percentage of the goal reached, capped at 100
    pub fn progress(&self) -> f64 {
        let pct = 100.0 * self.completed_days.len() as f64 / self.goal_days as f64;
        pct.min(100.0)
    }

    /// Whether the total number of completed days has reached the goal
    pub fn is_goal_reached(&self) -> bool {
        self.completed_days.len() >= self.goal_days as usize
    }

    pub fn longest_streak(&self) -> u32 {
        streak::longest_streak(&self.completed_days)
    }

    pub fn is_streak_alive(&self, today: NaiveDate) -> bool {
        streak::is_streak_alive(&self.completed_days, today)
    }

    /// Recompute derived fields against a new "today"
    ///
    /// Used after loading from storage, where the weekly window may have
    /// moved since the habit was saved. The explicit streak reset left by a
    /// failed group day is kept until the history changes again.
    pub fn refresh(&mut self, today: NaiveDate) {
        self.days_per_week_done = streak::days_done_this_week(&self.completed_days, today);
    }

    pub(crate) fn recompute(&mut self, today: NaiveDate) {
        self.days_per_week_done = streak::days_done_this_week(&self.completed_days, today);
        self.current_streak = streak::current_streak(&self.completed_days);
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
