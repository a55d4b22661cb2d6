/// Group habits: per-member check-ins and deadline finalization
///
/// A group day is all-or-nothing. It lands in the habit's own completed days
/// only once every current member has checked in, and once a day has been
/// finalized as failed no late check-in can bring it back.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use chrono::NaiveDate;

use crate::domain::{DomainError, GroupCode, Habit, MemberId};

/// Group-specific part of a habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupState {
    /// Invite code other members use to join; fixed at creation
    pub group_id: GroupCode,
    /// Current members
    #[serde(default)]
    pub members: BTreeSet<MemberId>,
    /// Days each current member personally checked in
    #[serde(default)]
    pub member_completed_days: BTreeMap<MemberId, BTreeSet<NaiveDate>>,
    /// Days finalized as failed
    #[serde(default)]
    pub failed_days: BTreeSet<NaiveDate>,
}

/// Result of a member check-in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInOutcome {
    /// Recorded; other members still have to check in
    Recorded,
    /// Recorded and the day is now complete for the whole group
    GroupCompleted,
    /// The member had already checked in for this day
    AlreadyRecorded,
    /// The day was finalized as failed and can no longer change
    DayLocked,
}

/// Result of finalizing a group day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// Not every member checked in; the day is now failed
    Failed,
    /// Every member checked in; the day counts for the group
    Completed,
    /// The day had already been finalized as failed
    AlreadyFinal,
}

/// Who has and has not checked in for a given day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckInStatus {
    pub day: NaiveDate,
    pub checked_in: Vec<MemberId>,
    pub waiting_on: Vec<MemberId>,
    pub failed: bool,
}

impl GroupState {
    pub fn new(group_id: GroupCode, members: impl IntoIterator<Item = MemberId>) -> Self {
        let mut state = Self {
            group_id,
            members: BTreeSet::new(),
            member_completed_days: BTreeMap::new(),
            failed_days: BTreeSet::new(),
        };
        for member in members {
            state.add_member(member);
        }
        state
    }

    pub fn is_member(&self, member: &MemberId) -> bool {
        self.members.contains(member)
    }

    /// Add a member; returns false if they were already in the group
    pub fn add_member(&mut self, member: MemberId) -> bool {
        if member.as_str().is_empty() || self.members.contains(&member) {
            return false;
        }
        self.member_completed_days.entry(member.clone()).or_default();
        self.members.insert(member)
    }

    /// Remove a member together with their check-in history
    ///
    /// Past days are not re-evaluated against the smaller group.
    pub fn remove_member(&mut self, member: &MemberId) -> bool {
        self.member_completed_days.remove(member);
        self.members.remove(member)
    }

    /// True when the group has members and every one of them checked in
    pub fn is_group_completed_on(&self, day: NaiveDate) -> bool {
        !self.members.is_empty()
            && self.members.iter().all(|member| {
                self.member_completed_days
                    .get(member)
                    .is_some_and(|days| days.contains(&day))
            })
    }

    pub fn is_failed_on(&self, day: NaiveDate) -> bool {
        self.failed_days.contains(&day)
    }

    pub fn check_in_status(&self, day: NaiveDate) -> CheckInStatus {
        let (checked_in, waiting_on): (Vec<_>, Vec<_>) = self.members.iter().cloned().partition(|member| {
            self.member_completed_days
                .get(member)
                .is_some_and(|days| days.contains(&day))
        });
        CheckInStatus {
            day,
            checked_in,
            waiting_on,
            failed: self.is_failed_on(day),
        }
    }

    fn record(&mut self, member: &MemberId, day: NaiveDate) -> bool {
        self.member_completed_days
            .entry(member.clone())
            .or_default()
            .insert(day)
    }

    fn fail(&mut self, day: NaiveDate) {
        self.failed_days.insert(day);
        for days in self.member_completed_days.values_mut() {
            days.remove(&day);
        }
    }
}

impl Habit {
    /// Add a member to a group habit
    pub fn add_member(&mut self, member: MemberId) -> Result<bool, DomainError> {
        let state = self.group_mut().ok_or(DomainError::NotAGroup)?;
        let added = state.add_member(member);
        if added {
            self.touch();
        }
        Ok(added)
    }

    /// Remove a member from a group habit
    pub fn remove_member(&mut self, member: &MemberId) -> Result<bool, DomainError> {
        let state = self.group_mut().ok_or(DomainError::NotAGroup)?;
        let removed = state.remove_member(member);
        if removed {
            self.touch();
        }
        Ok(removed)
    }

    /// Record that `member` completed the habit on `day`
    ///
    /// Fails for solo habits and for people who are not current members.
    /// A day already finalized as failed is left untouched.
    pub fn mark_member_completed(
        &mut self,
        member: &MemberId,
        day: NaiveDate,
        today: NaiveDate,
    ) -> Result<CheckInOutcome, DomainError> {
        let state = self.group_mut().ok_or(DomainError::NotAGroup)?;

        if !state.is_member(member) {
            return Err(DomainError::NotAMember {
                member: member.to_string(),
                group: state.group_id.to_string(),
            });
        }
        if state.is_failed_on(day) {
            return Ok(CheckInOutcome::DayLocked);
        }

        let recorded = state.record(member, day);
        let group_done = state.is_group_completed_on(day);

        if recorded {
            self.touch();
        }
        if group_done && self.mark_day_completed(day, today) {
            return Ok(CheckInOutcome::GroupCompleted);
        }

        Ok(if recorded {
            CheckInOutcome::Recorded
        } else {
            CheckInOutcome::AlreadyRecorded
        })
    }

    pub fn is_group_completed_on(&self, day: NaiveDate) -> bool {
        self.group().is_some_and(|state| state.is_group_completed_on(day))
    }

    /// Resolve `day` once its deadline has passed
    ///
    /// Meant to be driven by an external scheduler (typically for yesterday
    /// when the app comes to the foreground). A failed day wipes the member
    /// check-ins for that day and resets the streak to zero.
    pub fn finalize_day(
        &mut self,
        day: NaiveDate,
        today: NaiveDate,
    ) -> Result<FinalizeOutcome, DomainError> {
        let state = self.group_mut().ok_or(DomainError::NotAGroup)?;

        if state.is_failed_on(day) {
            return Ok(FinalizeOutcome::AlreadyFinal);
        }

        if state.is_group_completed_on(day) {
            self.mark_day_completed(day, today);
            return Ok(FinalizeOutcome::Completed);
        }

        state.fail(day);
        self.completed_days.remove(&day);
        self.recompute(today);
        self.current_streak = 0;
        self.touch();

        Ok(FinalizeOutcome::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pair_habit() -> Habit {
        Habit::new_group("Morning run", 30, [MemberId::from("A"), MemberId::from("B")])
    }

    #[test]
    fn test_group_all_or_nothing() {
        let day = date(2024, 3, 8);
        let mut habit = pair_habit();

        let outcome = habit.mark_member_completed(&"A".into(), day, day).unwrap();
        assert_eq!(outcome, CheckInOutcome::Recorded);
        assert!(!habit.is_group_completed_on(day));
        assert!(!habit.completed_days.contains(&day));

        let outcome = habit.mark_member_completed(&"B".into(), day, day).unwrap();
        assert_eq!(outcome, CheckInOutcome::GroupCompleted);
        assert!(habit.is_group_completed_on(day));
        assert!(habit.completed_days.contains(&day));
        assert_eq!(habit.current_streak, 1);
    }

    #[test]
    fn test_repeat_check_in_is_idempotent() {
        let day = date(2024, 3, 8);
        let mut habit = pair_habit();

        habit.mark_member_completed(&"A".into(), day, day).unwrap();
        let outcome = habit.mark_member_completed(&"A".into(), day, day).unwrap();
        assert_eq!(outcome, CheckInOutcome::AlreadyRecorded);
        assert_eq!(habit.group().unwrap().member_completed_days[&"A".into()].len(), 1);
    }

    #[test]
    fn test_non_member_check_in_fails() {
        let day = date(2024, 3, 8);
        let mut habit = pair_habit();

        let result = habit.mark_member_completed(&"C".into(), day, day);
        assert!(matches!(result, Err(DomainError::NotAMember { .. })));
    }

    #[test]
    fn test_solo_habit_rejects_group_operations() {
        let day = date(2024, 3, 8);
        let mut habit = Habit::new_solo("Read", 10);

        assert!(matches!(
            habit.mark_member_completed(&"A".into(), day, day),
            Err(DomainError::NotAGroup)
        ));
        assert!(matches!(habit.finalize_day(day, day), Err(DomainError::NotAGroup)));
        assert!(!habit.is_group_completed_on(day));
    }

    #[test]
    fn test_failure_lock() {
        let yesterday = date(2024, 3, 7);
        let today = date(2024, 3, 8);
        let mut habit = pair_habit();

        // Build a streak on the day before
        habit.mark_member_completed(&"A".into(), date(2024, 3, 6), today).unwrap();
        habit.mark_member_completed(&"B".into(), date(2024, 3, 6), today).unwrap();
        assert_eq!(habit.current_streak, 1);

        habit.mark_member_completed(&"A".into(), yesterday, today).unwrap();
        let outcome = habit.finalize_day(yesterday, today).unwrap();
        assert_eq!(outcome, FinalizeOutcome::Failed);

        let state = habit.group().unwrap();
        assert!(state.failed_days.contains(&yesterday));
        assert!(!state.member_completed_days[&"A".into()].contains(&yesterday));
        assert!(!habit.completed_days.contains(&yesterday));
        assert_eq!(habit.current_streak, 0);

        // Late check-in cannot resurrect the day
        let late = habit.mark_member_completed(&"B".into(), yesterday, today).unwrap();
        assert_eq!(late, CheckInOutcome::DayLocked);
        assert!(habit.group().unwrap().failed_days.contains(&yesterday));
        assert!(!habit.completed_days.contains(&yesterday));

        assert_eq!(
            habit.finalize_day(yesterday, today).unwrap(),
            FinalizeOutcome::AlreadyFinal
        );
    }

    #[test]
    fn test_finalize_completed_day() {
        let day = date(2024, 3, 7);
        let mut habit = pair_habit();

        habit.mark_member_completed(&"A".into(), day, day).unwrap();
        habit.mark_member_completed(&"B".into(), day, day).unwrap();
        assert_eq!(habit.finalize_day(day, day).unwrap(), FinalizeOutcome::Completed);
        assert!(habit.completed_days.contains(&day));
        assert!(habit.group().unwrap().failed_days.is_empty());
    }

    #[test]
    fn test_finalize_promotes_after_member_removal() {
        let day = date(2024, 3, 7);
        let mut habit = pair_habit();

        habit.mark_member_completed(&"A".into(), day, day).unwrap();
        habit.remove_member(&"B".into()).unwrap();
        // Removal alone does not re-evaluate the day
        assert!(!habit.completed_days.contains(&day));

        assert_eq!(habit.finalize_day(day, day).unwrap(), FinalizeOutcome::Completed);
        assert!(habit.completed_days.contains(&day));
    }

    #[test]
    fn test_empty_group_never_completes() {
        let day = date(2024, 3, 7);
        let mut habit = Habit::new_group("Walk", 10, Vec::<MemberId>::new());

        assert!(!habit.is_group_completed_on(day));
        assert_eq!(habit.finalize_day(day, day).unwrap(), FinalizeOutcome::Failed);
    }

    #[test]
    fn test_membership_changes() {
        let mut habit = pair_habit();

        assert!(!habit.add_member("A".into()).unwrap());
        assert!(habit.add_member("C".into()).unwrap());
        let state = habit.group().unwrap();
        assert!(state.member_completed_days[&"C".into()].is_empty());

        assert!(habit.remove_member(&"A".into()).unwrap());
        let state = habit.group().unwrap();
        assert!(!state.member_completed_days.contains_key(&"A".into()));
        assert!(!habit.remove_member(&"A".into()).unwrap());
    }

    #[test]
    fn test_check_in_status() {
        let day = date(2024, 3, 8);
        let mut habit = pair_habit();
        habit.mark_member_completed(&"B".into(), day, day).unwrap();

        let status = habit.group().unwrap().check_in_status(day);
        assert_eq!(status.checked_in, vec![MemberId::from("B")]);
        assert_eq!(status.waiting_on, vec![MemberId::from("A")]);
        assert!(!status.failed);
    }
}
