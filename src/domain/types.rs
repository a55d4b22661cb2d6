/// Core types used throughout the domain layer
///
/// This module defines the identifier newtypes (HabitId, MemberId, GroupCode)
/// and the local calendar-day helpers that every streak and weekly-progress
/// calculation is built on.

use std::fmt;

use serde::{Deserialize, Serialize};
use chrono::{Datelike, Duration, Local, NaiveDate};
use uuid::Uuid;

use crate::domain::DomainError;

/// Format used for day identifiers everywhere (persisted and on the wire)
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Unique identifier for a habit
///
/// This is a wrapper around UUID to provide type safety - you can't accidentally
/// pass a habit ID where a member identifier is expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HabitId(pub Uuid);

impl HabitId {
    /// Generate a new random habit ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a habit ID from a string (useful for database loading)
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

impl Default for HabitId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of a group member (usually a phone number)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(pub String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Shareable invite code of a group habit
///
/// Codes are six upper-case hex characters taken from a fresh v4 UUID.
/// Lookups are case-insensitive so a code typed by hand still matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupCode(pub String);

impl GroupCode {
    pub const LENGTH: usize = 6;

    /// Generate a new random invite code
    pub fn generate() -> Self {
        let raw = Uuid::new_v4().simple().to_string();
        Self(raw[..Self::LENGTH].to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against user input, ignoring case and surrounding whitespace
    pub fn matches(&self, input: &str) -> bool {
        self.0.eq_ignore_ascii_case(input.trim())
    }
}

impl fmt::Display for GroupCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Today's date in the local timezone
///
/// Day identifiers must come from local calendar components. Deriving them
/// from a UTC timestamp shifts late-evening completions onto the next day.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Format a day as its `YYYY-MM-DD` identifier
pub fn day_key(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` day identifier
pub fn parse_day(s: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(s.trim(), DAY_FORMAT)
        .map_err(|_| DomainError::InvalidDate(format!("expected YYYY-MM-DD, got '{}'", s)))
}

/// Monday of the week containing `today`
///
/// Sunday belongs to the week that started six days earlier.
pub fn week_start(today: NaiveDate) -> NaiveDate {
    let offset = match today.weekday().number_from_sunday() - 1 {
        0 => -6,
        day_of_week => 1 - day_of_week as i64,
    };
    today + Duration::days(offset)
}
