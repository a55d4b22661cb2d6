/// Source of "today" for the repository
///
/// Streaks, weekly progress and default check-in days all depend on the
/// local calendar day, so the repository asks a clock instead of reading the
/// system time directly. Tests pin or advance the day with `ManualClock`.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::domain::local_today;

pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local calendar day of the host
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        local_today()
    }
}

/// Clock that only moves when told to; clones share the same day
#[derive(Debug, Clone)]
pub struct ManualClock {
    day: Arc<Mutex<NaiveDate>>,
}

impl ManualClock {
    pub fn new(day: NaiveDate) -> Self {
        Self { day: Arc::new(Mutex::new(day)) }
    }

    pub fn set(&self, day: NaiveDate) {
        *self.day.lock().unwrap_or_else(|p| p.into_inner()) = day;
    }
}

impl Clock for ManualClock {
    fn today(&self) -> NaiveDate {
        *self.day.lock().unwrap_or_else(|p| p.into_inner())
    }
}
