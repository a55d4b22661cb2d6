/// Streak and weekly progress calculation
///
/// These are pure functions over a habit's completed days. The Habit entity
/// calls them after every change to its history so the derived fields never
/// drift from the underlying set.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};

use crate::domain::week_start;

/// Length of the run of consecutive days ending at the latest completion
///
/// The walk starts from the most recent entry and moves strictly backward,
/// comparing each earlier entry to the expected predecessor. It does not
/// re-anchor to today: a history ending yesterday still reports its run.
/// Use `is_streak_alive` to ask whether that run is still current.
pub fn current_streak(completed: &BTreeSet<NaiveDate>) -> u32 {
    let mut days = completed.iter().rev();
    let Some(latest) = days.next() else {
        return 0;
    };

    let mut streak = 1;
    let mut expected = *latest - Duration::days(1);

    for day in days {
        if *day != expected {
            break;
        }
        streak += 1;
        expected = expected - Duration::days(1);
    }

    streak
}

/// Longest run of consecutive days anywhere in the history
pub fn longest_streak(completed: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for day in completed {
        run = match previous {
            Some(prev) if *day - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*day);
    }

    longest
}

/// Whether the most recent run still counts as of `today`
///
/// A run is alive while its latest day is today or yesterday; once a whole
/// day passes without a completion the run is over even though
/// `current_streak` keeps reporting its length.
pub fn is_streak_alive(completed: &BTreeSet<NaiveDate>, today: NaiveDate) -> bool {
    match completed.iter().next_back() {
        Some(latest) => *latest >= today - Duration::days(1),
        None => false,
    }
}

/// Number of completed days in the Monday-starting week of `today`,
/// counting only days up to and including today
pub fn days_done_this_week(completed: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let monday = week_start(today);
    let mut count = 0;

    for offset in 0..7 {
        let day = monday + Duration::days(offset);
        if day > today {
            break;
        }
        if completed.contains(&day) {
            count += 1;
        }
    }

    count
}
