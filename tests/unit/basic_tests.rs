/// Basic unit tests for the habit domain and estimator
use chrono::{Duration, NaiveDate};
use group_habit_tracker::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[cfg(test)]
mod basic_unit_tests {
    use super::*;

    #[test]
    fn test_remarking_is_a_no_op() {
        let today = date(2024, 3, 8);
        let mut habit = Habit::new_solo("Read", 10);

        assert!(habit.mark_day_completed(today, today));
        let stamp = habit.updated_at;

        assert!(!habit.mark_day_completed(today, today));
        assert_eq!(habit.updated_at, stamp);
        assert_eq!(habit.completed_days.len(), 1);

        assert!(habit.unmark_day_completed(today, today));
        assert!(!habit.unmark_day_completed(today, today));
        assert!(habit.completed_days.is_empty());
    }

    #[test]
    fn test_streak_with_and_without_gap() {
        let today = date(2024, 3, 8);

        let mut consecutive = Habit::new_solo("Read", 10);
        for offset in 0..3 {
            consecutive.mark_day_completed(today - Duration::days(offset), today);
        }
        assert_eq!(consecutive.current_streak, 3);

        let mut gapped = Habit::new_solo("Read", 10);
        gapped.mark_day_completed(today, today);
        gapped.mark_day_completed(today - Duration::days(2), today);
        assert_eq!(gapped.current_streak, 1);
    }

    #[test]
    fn test_weekly_progress_counts_current_week_only() {
        // 2024-03-04 is a Monday
        let friday = date(2024, 3, 8);
        let mut habit = Habit::new_solo("Stretch", 30);
        for day in [date(2024, 3, 4), date(2024, 3, 6), friday] {
            habit.mark_day_completed(day, friday);
        }
        assert_eq!(habit.days_per_week_done, 3);

        let sunday = date(2024, 3, 10);
        habit.refresh(sunday);
        assert_eq!(habit.days_per_week_done, 3);

        let next_monday = date(2024, 3, 11);
        habit.mark_day_completed(next_monday, next_monday);
        assert_eq!(habit.days_per_week_done, 1);
    }

    #[test]
    fn test_group_all_or_nothing_and_failure_lock() {
        let day = date(2024, 3, 7);
        let today = date(2024, 3, 8);
        let members = [MemberId::from("A"), MemberId::from("B")];

        let mut completed = Habit::new_group("Run", 30, members.clone());
        completed.mark_member_completed(&"A".into(), day, today).unwrap();
        assert!(!completed.is_group_completed_on(day));
        assert!(!completed.completed_days.contains(&day));
        completed.mark_member_completed(&"B".into(), day, today).unwrap();
        assert!(completed.completed_days.contains(&day));

        let mut failed = Habit::new_group("Run", 30, members);
        failed.mark_member_completed(&"A".into(), day, today).unwrap();
        assert_eq!(failed.finalize_day(day, today).unwrap(), FinalizeOutcome::Failed);
        assert!(failed.group().unwrap().failed_days.contains(&day));
        assert!(!failed.completed_days.contains(&day));
        assert_eq!(failed.current_streak, 0);

        let late = failed.mark_member_completed(&"B".into(), day, today).unwrap();
        assert_eq!(late, CheckInOutcome::DayLocked);
        assert!(failed.group().unwrap().is_failed_on(day));
        assert!(!failed.completed_days.contains(&day));
    }

    #[test]
    fn test_non_member_check_in_fails_loudly() {
        let day = date(2024, 3, 8);
        let mut habit = Habit::new_group("Run", 30, [MemberId::from("A")]);
        assert!(matches!(
            habit.mark_member_completed(&"Z".into(), day, day),
            Err(DomainError::NotAMember { .. })
        ));
    }

    #[test]
    fn test_group_round_trip_preserves_queries() {
        let today = date(2024, 3, 8);
        let mut habit = Habit::new_group("Run", 10, [MemberId::from("A"), MemberId::from("B")]);
        for member in ["A", "B"] {
            habit.mark_member_completed(&member.into(), date(2024, 3, 6), today).unwrap();
        }
        habit.mark_member_completed(&"A".into(), date(2024, 3, 7), today).unwrap();
        habit.finalize_day(date(2024, 3, 7), today).unwrap();
        habit.mark_member_completed(&"B".into(), today, today).unwrap();

        let json = serde_json::to_string(&habit).unwrap();
        let restored: Habit = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, habit);
        for day in [date(2024, 3, 6), date(2024, 3, 7), today] {
            assert_eq!(restored.is_group_completed_on(day), habit.is_group_completed_on(day));
        }
        assert_eq!(restored.progress(), habit.progress());
    }

    #[test]
    fn test_estimator_is_deterministic_and_ordered() {
        let first = estimate("Drink water", None, None);
        let second = estimate("Drink water", None, None);
        assert_eq!(first, second);
        assert_eq!(first.difficulty, Difficulty::Tiny);

        let plunge = estimate("cold plunge", None, None);
        assert!(plunge.recommended_days > first.recommended_days);
    }
}
