/// Integration tests across the repository, storage and server layers
use chrono::NaiveDate;
use group_habit_tracker::repository::ManualClock;
use group_habit_tracker::*;
use tempfile::{NamedTempFile, TempDir};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct FailingSink;

impl NotificationSink for FailingSink {
    fn dispatch(&self, _event: &HabitEvent) -> Result<(), NotifyError> {
        Err(NotifyError::Unavailable("sms gateway down".to_string()))
    }
}

#[cfg(test)]
mod basic_integration_tests {
    use super::*;

    #[test]
    fn test_server_creation() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let server = HabitTrackerServer::new(dir.path().join("habits.db"), RepositoryConfig::default())
            .expect("Failed to create server");
        assert!(server.repository().get_all_habits().is_empty());
    }

    #[test]
    fn test_group_history_survives_reopen() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let db_path = temp_file.path().to_path_buf();
        let today = date(2024, 3, 8);
        let clock = ManualClock::new(today);

        let group_id = {
            let storage = SqliteStorage::new(&db_path).expect("Failed to create storage");
            let mut repository =
                HabitRepository::with_clock(storage, RepositoryConfig::default(), clock.clone())
                    .unwrap();
            let group = repository
                .create_group_habit("Morning run", 20, vec!["A".into(), "B".into()])
                .unwrap()
                .unwrap();

            for member in ["A", "B"] {
                repository
                    .check_in_member(&group.id, &member.into(), Some(date(2024, 3, 6)))
                    .unwrap();
            }
            repository
                .check_in_member(&group.id, &"A".into(), Some(date(2024, 3, 7)))
                .unwrap();
            repository.finalize_group_habits_for_day(date(2024, 3, 7)).unwrap();
            repository.check_in_member(&group.id, &"B".into(), None).unwrap();
            group.id
        };

        let storage = SqliteStorage::new(&db_path).expect("Failed to reopen storage");
        let repository =
            HabitRepository::with_clock(storage, RepositoryConfig::default(), clock).unwrap();
        let habit = repository.get_habit(&group_id).expect("group habit reloaded");

        assert!(habit.is_group());
        assert!(habit.is_group_completed_on(date(2024, 3, 6)));
        assert!(habit.group().unwrap().is_failed_on(date(2024, 3, 7)));
        assert!(!habit.completed_days.contains(&date(2024, 3, 7)));
        assert_eq!(habit.current_streak, 0);
        assert_eq!(habit.progress(), 5.0);

        let status = habit.group().unwrap().check_in_status(today);
        assert_eq!(status.checked_in, vec![MemberId::from("B")]);
        assert_eq!(status.waiting_on, vec![MemberId::from("A")]);
    }

    #[test]
    fn test_empty_group_stays_a_group() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = dir.path().join("habits.db");

        let id = {
            let storage = SqliteStorage::new(&db_path).unwrap();
            let mut repository = HabitRepository::new(storage, RepositoryConfig::default()).unwrap();
            repository.create_group_habit("Meditate", 10, Vec::new()).unwrap().unwrap().id
        };

        let repository =
            HabitRepository::new(SqliteStorage::new(&db_path).unwrap(), RepositoryConfig::default())
                .unwrap();
        let habit = repository.get_habit(&id).unwrap();
        assert!(habit.is_group());
        assert!(habit.group().unwrap().members.is_empty());
    }

    #[test]
    fn test_capacity_frees_up_after_delete() {
        let storage = MemoryStorage::new();
        let mut repository = HabitRepository::new(storage.clone(), RepositoryConfig::default()).unwrap();

        let first = repository.create_solo_habit("Read", 10).unwrap().unwrap();
        let second = repository.create_solo_habit("Walk", 10).unwrap().unwrap();
        repository.create_group_habit("Run", 10, vec!["A".into()]).unwrap().unwrap();
        assert!(repository.create_solo_habit("Journal", 10).unwrap().is_none());

        repository.delete_habit(&first.id).unwrap();
        assert!(repository.create_solo_habit("Journal", 10).unwrap().is_some());
        assert!(repository.create_solo_habit("Sketch", 10).unwrap().is_none());

        repository.remove_habit_permanently(&second.id).unwrap();
        assert!(repository.create_solo_habit("Sketch", 10).unwrap().is_some());

        // One load at construction, one save per successful mutation
        assert_eq!(storage.load_count(), 1);
        assert_eq!(storage.save_count(), 7);
        assert_eq!(storage.saved().len(), 4);
    }

    #[test]
    fn test_failed_notification_keeps_finalization() {
        let today = date(2024, 3, 8);
        let yesterday = date(2024, 3, 7);
        let storage = MemoryStorage::new();
        let mut repository = HabitRepository::with_clock(
            storage.clone(),
            RepositoryConfig::default(),
            ManualClock::new(today),
        )
        .unwrap();
        repository.set_notifier(FailingSink);

        let group = repository
            .create_group_habit("Run", 10, vec!["A".into(), "B".into()])
            .unwrap()
            .unwrap();
        repository
            .check_in_member(&group.id, &"A".into(), Some(yesterday))
            .unwrap();

        let outcomes = repository.finalize_group_habits_for_day(yesterday).unwrap();
        assert_eq!(outcomes, vec![(group.id.clone(), FinalizeOutcome::Failed)]);

        let saved = storage.saved();
        let stored = saved.iter().find(|h| h.id == group.id).unwrap();
        assert!(stored.group().unwrap().is_failed_on(yesterday));
    }

    #[test]
    fn test_join_by_code_then_complete_day() {
        let today = date(2024, 3, 8);
        let mut repository = HabitRepository::with_clock(
            MemoryStorage::new(),
            RepositoryConfig::default(),
            ManualClock::new(today),
        )
        .unwrap();
        let group = repository.create_group_habit("Run", 10, vec!["A".into()]).unwrap().unwrap();
        let code = group.group().unwrap().group_id.to_string().to_lowercase();

        let joined = repository.join_group_by_code(&code, "B".into()).unwrap();
        assert_eq!(joined, Some(group.id.clone()));

        let first = repository.check_in_member(&group.id, &"A".into(), None).unwrap();
        assert_eq!(first, Some(CheckInOutcome::Recorded));
        let second = repository.check_in_member(&group.id, &"B".into(), None).unwrap();
        assert_eq!(second, Some(CheckInOutcome::GroupCompleted));

        let stats = repository.get_stats(&group.id).unwrap();
        assert!(stats.completed_today);
        assert_eq!(stats.current_streak, 1);
    }
}
