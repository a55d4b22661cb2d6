/// Habit repository
///
/// Owns the in-memory habit collection for one device. Every successful
/// mutation is followed by a save through the injected storage, and the
/// collection is loaded exactly once when the repository is built.

pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{
    streak, CheckInOutcome, DomainError, FinalizeOutcome, GroupCode, Habit, HabitId, MemberId,
};
use crate::notify::{dispatch_best_effort, HabitEvent, NotificationSink, TracingSink};
use crate::storage::{HabitStorage, StorageError};

/// Default number of habits a user may have active at once
pub const MAX_ACTIVE_HABITS: usize = 3;

/// Errors that can occur during repository operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Domain(#[from] DomainError),
}

/// Policy knobs for the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Creation is refused once this many habits are active
    pub max_active_habits: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            max_active_habits: MAX_ACTIVE_HABITS,
        }
    }
}

/// Read-only summary of one habit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitStats {
    pub action: String,
    pub habit_type: &'static str,
    pub goal_days: u32,
    pub progress: f64,
    pub goal_reached: bool,
    pub total_completed: usize,
    pub completed_today: bool,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub streak_alive: bool,
    pub days_per_week_done: u32,
}

pub struct HabitRepository<S: HabitStorage> {
    storage: S,
    habits: Vec<Habit>,
    config: RepositoryConfig,
    clock: Box<dyn Clock>,
    notifier: Box<dyn NotificationSink>,
    /// Day the derived weekly counts were last computed for
    last_refreshed: NaiveDate,
}

impl<S: HabitStorage> HabitRepository<S> {
    /// Build a repository on the system clock and load stored habits
    pub fn new(storage: S, config: RepositoryConfig) -> Result<Self, RepositoryError> {
        Self::with_clock(storage, config, SystemClock)
    }

    /// Build a repository on a caller-supplied clock and load stored habits
    pub fn with_clock(
        storage: S,
        config: RepositoryConfig,
        clock: impl Clock + 'static,
    ) -> Result<Self, RepositoryError> {
        let mut habits = storage.load()?;

        let today = clock.today();
        for habit in &mut habits {
            habit.refresh(today);
        }

        tracing::info!(
            "Habit repository loaded {} habits ({} active)",
            habits.len(),
            habits.iter().filter(|h| h.is_active).count()
        );

        Ok(Self {
            storage,
            habits,
            config,
            clock: Box::new(clock),
            notifier: Box::new(TracingSink),
            last_refreshed: today,
        })
    }

    /// Replace the notification sink (defaults to logging only)
    pub fn set_notifier(&mut self, notifier: impl NotificationSink + 'static) {
        self.notifier = Box::new(notifier);
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Recompute weekly progress if the calendar day moved since the last call
    ///
    /// Every mutation runs this first; long-lived callers should also run it
    /// before reading habits directly. Returns the current day.
    pub fn roll_over(&mut self) -> NaiveDate {
        let today = self.today();
        if today != self.last_refreshed {
            tracing::debug!("Day rolled over from {} to {}", self.last_refreshed, today);
            for habit in &mut self.habits {
                habit.refresh(today);
            }
            self.last_refreshed = today;
        }
        today
    }

    pub fn active_count(&self) -> usize {
        self.habits.iter().filter(|h| h.is_active).count()
    }

    pub fn has_capacity(&self) -> bool {
        self.active_count() < self.config.max_active_habits
    }

    // Creation

    /// Create a solo habit
    ///
    /// Returns `Ok(None)` when the active-habit limit is reached or the input
    /// is unusable (blank action, zero goal).
    pub fn create_solo_habit(
        &mut self,
        action: &str,
        goal_days: u32,
    ) -> Result<Option<Habit>, RepositoryError> {
        self.roll_over();
        if !self.accepts_new(action, goal_days) {
            return Ok(None);
        }
        self.insert(Habit::new_solo(action, goal_days))
    }

    /// Create a group habit with its initial members and a fresh invite code
    pub fn create_group_habit(
        &mut self,
        action: &str,
        goal_days: u32,
        members: Vec<MemberId>,
    ) -> Result<Option<Habit>, RepositoryError> {
        self.roll_over();
        if !self.accepts_new(action, goal_days) {
            return Ok(None);
        }

        let mut code = GroupCode::generate();
        while self.find_by_code(code.as_str()).is_some() {
            code = GroupCode::generate();
        }

        self.insert(Habit::new_group_with_code(action, goal_days, members, code))
    }

    fn accepts_new(&self, action: &str, goal_days: u32) -> bool {
        if action.trim().is_empty() || goal_days == 0 {
            tracing::debug!("Rejected habit creation: empty action or zero goal");
            return false;
        }
        if !self.has_capacity() {
            tracing::info!(
                "Rejected habit creation: {} active habits already (limit {})",
                self.active_count(),
                self.config.max_active_habits
            );
            return false;
        }
        true
    }

    fn insert(&mut self, habit: Habit) -> Result<Option<Habit>, RepositoryError> {
        tracing::debug!("Created {} habit '{}' ({})", habit.kind.label(), habit.action, habit.id);
        let snapshot = habit.clone();
        self.habits.push(habit);
        self.persist()?;
        Ok(Some(snapshot))
    }

    // Queries

    pub fn get_habit(&self, id: &HabitId) -> Option<&Habit> {
        self.habits.iter().find(|h| &h.id == id)
    }

    pub fn get_all_habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn get_active_habits(&self) -> Vec<&Habit> {
        self.habits.iter().filter(|h| h.is_active).collect()
    }

    /// Find a group habit by invite code (case-insensitive)
    pub fn find_by_code(&self, code: &str) -> Option<&Habit> {
        self.habits
            .iter()
            .find(|h| h.group().is_some_and(|g| g.group_id.matches(code)))
    }

    pub fn get_stats(&self, id: &HabitId) -> Option<HabitStats> {
        let today = self.today();
        self.get_habit(id).map(|habit| HabitStats {
            action: habit.action.clone(),
            habit_type: habit.kind.label(),
            goal_days: habit.goal_days,
            progress: habit.progress(),
            goal_reached: habit.is_goal_reached(),
            total_completed: habit.completed_days.len(),
            completed_today: habit.is_completed_today(today),
            current_streak: habit.current_streak,
            longest_streak: habit.longest_streak(),
            streak_alive: habit.is_streak_alive(today),
            days_per_week_done: streak::days_done_this_week(&habit.completed_days, today),
        })
    }

    // Mutation

    /// Apply a partial edit; false when the habit is unknown or nothing changed
    pub fn update_habit(
        &mut self,
        id: &HabitId,
        action: Option<&str>,
        goal_days: Option<u32>,
    ) -> Result<bool, RepositoryError> {
        self.roll_over();
        let Some(index) = self.position(id) else {
            return Ok(false);
        };
        if !self.habits[index].edit(action, goal_days) {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Soft delete: the habit stops counting as active but keeps its history
    pub fn delete_habit(&mut self, id: &HabitId) -> Result<bool, RepositoryError> {
        self.roll_over();
        let Some(index) = self.position(id) else {
            return Ok(false);
        };
        let habit = &mut self.habits[index];
        habit.is_active = false;
        habit.touch();
        tracing::debug!("Soft deleted habit '{}' ({})", habit.action, habit.id);
        self.persist()?;
        Ok(true)
    }

    /// Hard delete: the habit is gone from the collection
    pub fn remove_habit_permanently(&mut self, id: &HabitId) -> Result<bool, RepositoryError> {
        self.roll_over();
        let Some(index) = self.position(id) else {
            return Ok(false);
        };
        let habit = self.habits.remove(index);
        tracing::debug!("Permanently removed habit '{}' ({})", habit.action, habit.id);
        self.persist()?;
        Ok(true)
    }

    /// Mark today complete on a solo habit
    ///
    /// Group habits are refused: their days only complete through member
    /// check-ins, see `check_in_member`.
    pub fn mark_completed(&mut self, id: &HabitId) -> Result<bool, RepositoryError> {
        let today = self.roll_over();
        let Some(index) = self.solo_position(id) else {
            return Ok(false);
        };

        let habit = &mut self.habits[index];
        if !habit.mark_day_completed(today, today) {
            return Ok(false);
        }
        let event = HabitEvent::DaySucceeded {
            habit_id: habit.id.clone(),
            action: habit.action.clone(),
            day: today,
        };

        self.persist()?;
        dispatch_best_effort(self.notifier.as_ref(), &event);
        Ok(true)
    }

    /// Undo today's completion on a solo habit
    pub fn unmark_completed(&mut self, id: &HabitId) -> Result<bool, RepositoryError> {
        let today = self.roll_over();
        let Some(index) = self.solo_position(id) else {
            return Ok(false);
        };

        if !self.habits[index].unmark_day_completed(today, today) {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Join a group habit by its invite code
    ///
    /// Returns the group's id, or `None` when no active group has that code.
    pub fn join_group_by_code(
        &mut self,
        code: &str,
        member: MemberId,
    ) -> Result<Option<HabitId>, RepositoryError> {
        self.roll_over();
        let Some(index) = self
            .habits
            .iter()
            .position(|h| h.is_active && h.group().is_some_and(|g| g.group_id.matches(code)))
        else {
            return Ok(None);
        };

        let habit = &mut self.habits[index];
        let id = habit.id.clone();
        if habit.add_member(member.clone())? {
            tracing::debug!("{} joined group '{}' ({})", member, habit.action, id);
            self.persist()?;
        }
        Ok(Some(id))
    }

    /// Add a member to a group habit; false when unknown or already a member
    pub fn add_member(&mut self, id: &HabitId, member: MemberId) -> Result<bool, RepositoryError> {
        self.roll_over();
        let Some(index) = self.position(id) else {
            return Ok(false);
        };
        if !self.habits[index].add_member(member)? {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Remove a member and their check-in history from a group habit
    pub fn remove_member(&mut self, id: &HabitId, member: &MemberId) -> Result<bool, RepositoryError> {
        self.roll_over();
        let Some(index) = self.position(id) else {
            return Ok(false);
        };
        if !self.habits[index].remove_member(member)? {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Record a member's check-in on a group habit
    ///
    /// `day` defaults to today. Returns `Ok(None)` for an unknown habit and
    /// an error when `member` is not in the group.
    pub fn check_in_member(
        &mut self,
        id: &HabitId,
        member: &MemberId,
        day: Option<NaiveDate>,
    ) -> Result<Option<CheckInOutcome>, RepositoryError> {
        let today = self.roll_over();
        let day = day.unwrap_or(today);
        let Some(index) = self.position(id) else {
            return Ok(None);
        };

        let habit = &mut self.habits[index];
        let outcome = habit.mark_member_completed(member, day, today)?;

        match outcome {
            CheckInOutcome::Recorded => self.persist()?,
            CheckInOutcome::GroupCompleted => {
                let event = HabitEvent::DaySucceeded {
                    habit_id: habit.id.clone(),
                    action: habit.action.clone(),
                    day,
                };
                self.persist()?;
                dispatch_best_effort(self.notifier.as_ref(), &event);
            }
            CheckInOutcome::AlreadyRecorded | CheckInOutcome::DayLocked => {}
        }

        Ok(Some(outcome))
    }

    /// Finalize `day` on every active group habit
    ///
    /// Must be driven by an external scheduler once the day's deadline has
    /// passed; the repository never finalizes on its own.
    pub fn finalize_group_habits_for_day(
        &mut self,
        day: NaiveDate,
    ) -> Result<Vec<(HabitId, FinalizeOutcome)>, RepositoryError> {
        let today = self.roll_over();
        let mut outcomes = Vec::new();
        let mut events = Vec::new();

        for habit in self.habits.iter_mut().filter(|h| h.is_active && h.is_group()) {
            let already_completed = habit.is_completed_on(day);
            let outcome = habit.finalize_day(day, today)?;

            match outcome {
                FinalizeOutcome::Failed => events.push(HabitEvent::DayFailed {
                    habit_id: habit.id.clone(),
                    action: habit.action.clone(),
                    day,
                }),
                FinalizeOutcome::Completed if !already_completed => {
                    events.push(HabitEvent::DaySucceeded {
                        habit_id: habit.id.clone(),
                        action: habit.action.clone(),
                        day,
                    })
                }
                _ => {}
            }
            outcomes.push((habit.id.clone(), outcome));
        }

        if !events.is_empty() {
            self.persist()?;
        }
        for event in &events {
            dispatch_best_effort(self.notifier.as_ref(), event);
        }

        tracing::info!(
            "Finalized {} group habits for {} ({} state changes)",
            outcomes.len(),
            day,
            events.len()
        );
        Ok(outcomes)
    }

    // Helpers

    fn position(&self, id: &HabitId) -> Option<usize> {
        self.habits.iter().position(|h| &h.id == id)
    }

    fn solo_position(&self, id: &HabitId) -> Option<usize> {
        let index = self.position(id)?;
        if self.habits[index].is_group() {
            tracing::debug!("Refused direct completion on group habit {}", id);
            return None;
        }
        Some(index)
    }

    fn persist(&self) -> Result<(), RepositoryError> {
        self.storage.save(&self.habits)?;
        Ok(())
    }
}
