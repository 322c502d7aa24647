/// Core types and enums used throughout the domain layer
///
/// This module defines the identifier newtypes, the weekly Frequency and the
/// ActivityStatus that Habit, Activity and the storage layer share.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// Unique identifier for a user
///
/// Users are owned by an external account system; this crate only ever sees
/// their opaque id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Unique identifier for a habit
///
/// Generated ids take the form `<owner>_<uuid>`, so a habit id may itself
/// contain the activity id separator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(pub String);

impl HabitId {
    /// Generate a new random habit id owned by `owner`
    pub fn generate(owner: &UserId) -> Self {
        Self(format!("{}_{}", owner, Uuid::new_v4()))
    }

    /// Wrap an existing id string (useful when loading or parsing requests)
    pub fn from_string(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HabitId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Minimum number of qualifying days per week, always within 1-7
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Frequency(u8);

impl Frequency {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 7;

    /// Validate a raw frequency value
    pub fn new(times_per_week: i64) -> Result<Self, DomainError> {
        if times_per_week < Self::MIN as i64 || times_per_week > Self::MAX as i64 {
            return Err(DomainError::InvalidFrequency(times_per_week.to_string()));
        }
        Ok(Self(times_per_week as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Frequency {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Frequency> for i64 {
    fn from(frequency: Frequency) -> Self {
        frequency.0 as i64
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Logged outcome for a single day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityStatus {
    /// The habit was fully done
    Success,
    /// A reduced version was done; keeps the week alive but does not score
    Minimum,
    /// Explicitly not done; ignored by scoring
    NotDone,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Success => "SUCCESS",
            ActivityStatus::Minimum => "MINIMUM",
            ActivityStatus::NotDone => "NOT_DONE",
        }
    }
}

impl FromStr for ActivityStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(ActivityStatus::Success),
            "MINIMUM" => Ok(ActivityStatus::Minimum),
            "NOT_DONE" => Ok(ActivityStatus::NotDone),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
