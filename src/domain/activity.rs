/// Activity entity and the activity identifier codec
///
/// An activity is a single day's logged outcome for a habit. Its id is not
/// random: it is derived from the habit id and the day, which is what makes
/// logging the same day twice an update instead of a duplicate.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{ActivityStatus, DomainError, HabitId};

/// Separator between the habit id and the date in an activity id
pub const ACTIVITY_ID_SEPARATOR: char = '_';

/// Day granularity only; no time of day is ever stored
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` day, rejecting anything that would not format back
/// to exactly the same text
pub fn parse_date(s: &str) -> Result<NaiveDate, DomainError> {
    let date = NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| DomainError::InvalidDate(s.to_string()))?;

    if date.format(DATE_FORMAT).to_string() != s {
        return Err(DomainError::InvalidDate(s.to_string()));
    }

    Ok(date)
}

/// Identifier of an activity: `<habit id>_<YYYY-MM-DD>`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub String);

impl ActivityId {
    /// Encode a (habit, day) pair
    pub fn encode(habit_id: &HabitId, date: NaiveDate) -> Self {
        Self(format!(
            "{}{}{}",
            habit_id,
            ACTIVITY_ID_SEPARATOR,
            date.format(DATE_FORMAT)
        ))
    }

    /// Validate a raw id string
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let id = Self(s.to_string());
        id.decode()?;
        Ok(id)
    }

    /// Split back into (habit, day)
    ///
    /// Habit ids may contain the separator, so the split is on its last
    /// occurrence.
    pub fn decode(&self) -> Result<(HabitId, NaiveDate), DomainError> {
        let (habit_id, date) = self
            .0
            .rsplit_once(ACTIVITY_ID_SEPARATOR)
            .ok_or_else(|| DomainError::InvalidActivityId(self.0.clone()))?;

        let date = parse_date(date).map_err(|_| DomainError::InvalidActivityId(self.0.clone()))?;

        Ok((HabitId::from_string(habit_id), date))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A record of a habit's outcome on a specific day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Derived from `habit_id` and `logged_date`
    pub id: ActivityId,
    /// Which habit this activity is for
    pub habit_id: HabitId,
    /// Which day the outcome is for
    pub logged_date: NaiveDate,
    pub status: ActivityStatus,
}

impl Activity {
    pub fn new(habit_id: HabitId, logged_date: NaiveDate, status: ActivityStatus) -> Self {
        Self {
            id: ActivityId::encode(&habit_id, logged_date),
            habit_id,
            logged_date,
            status,
        }
    }
}
