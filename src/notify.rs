/// Accountability notifications
///
/// The repository reports day outcomes as events. Delivery (SMS, webhook) is
/// someone else's job and is best-effort: a failed dispatch is logged and the
/// state transition that produced the event stands.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{day_key, HabitId};

/// Something worth telling the people behind a habit about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HabitEvent {
    DaySucceeded { habit_id: HabitId, action: String, day: NaiveDate },
    DayFailed { habit_id: HabitId, action: String, day: NaiveDate },
}

impl HabitEvent {
    pub fn habit_id(&self) -> &HabitId {
        match self {
            HabitEvent::DaySucceeded { habit_id, .. } | HabitEvent::DayFailed { habit_id, .. } => {
                habit_id
            }
        }
    }

    pub fn day(&self) -> NaiveDate {
        match self {
            HabitEvent::DaySucceeded { day, .. } | HabitEvent::DayFailed { day, .. } => *day,
        }
    }
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notification channel unavailable: {0}")]
    Unavailable(String),
}

/// Outbound channel for habit events
pub trait NotificationSink {
    fn dispatch(&self, event: &HabitEvent) -> Result<(), NotifyError>;
}

/// Sink that only writes events to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn dispatch(&self, event: &HabitEvent) -> Result<(), NotifyError> {
        match event {
            HabitEvent::DaySucceeded { habit_id, action, day } => {
                tracing::info!("'{}' ({}) succeeded on {}", action, habit_id, day_key(*day));
            }
            HabitEvent::DayFailed { habit_id, action, day } => {
                tracing::info!("'{}' ({}) failed on {}", action, habit_id, day_key(*day));
            }
        }
        Ok(())
    }
}

/// Send an event, logging instead of propagating delivery failures
pub(crate) fn dispatch_best_effort(sink: &dyn NotificationSink, event: &HabitEvent) {
    if let Err(e) = sink.dispatch(event) {
        tracing::warn!(
            "Failed to deliver notification for habit {} on {}: {}",
            event.habit_id(),
            day_key(event.day()),
            e
        );
    }
}
