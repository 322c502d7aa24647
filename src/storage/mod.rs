/// Storage layer for persisting habit data
///
/// This module defines the storage contract every backend satisfies and the
/// file-backed implementation: in-memory indices behind one mutex, reloaded
/// from a single JSON document when stale and rewritten whole on mutation.

pub mod document;
pub mod file;

// Re-export the main storage types
pub use document::*;
pub use file::*;

use chrono::NaiveDate;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::domain::{
    Activity, ActivityId, ActivityStatus, DomainError, Habit, HabitChanges, HabitId, NewHabit,
    UserId,
};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: String },

    #[error("Activity not found: {activity_id}")]
    ActivityNotFound { activity_id: String },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("Invalid input: {0}")]
    Input(#[from] DomainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupted document: {detail}")]
    Corrupted { detail: String },

    #[error("Store lock poisoned by an earlier invariant violation")]
    Poisoned,
}

impl StorageError {
    pub(crate) fn habit_not_found(habit_id: &HabitId) -> Self {
        StorageError::HabitNotFound {
            habit_id: habit_id.to_string(),
        }
    }
}

/// One window of a habit's activity log
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActivityPage {
    /// Activities in ascending day order
    pub activities: Vec<Activity>,
    /// Whether more matching activities exist beyond the limit
    pub has_more: bool,
}

/// Trait defining the storage interface for habits
///
/// A relational backend could implement the same contract; it must honor the
/// same invariants and error taxonomy as the file-backed one.
pub trait HabitStorage {
    /// Create a fully-formed habit and register it with its owner
    fn create_habit(&self, habit: NewHabit) -> Result<HabitId, StorageError>;

    /// Get a habit by id
    fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError>;

    /// Apply field changes to an existing habit
    fn update_habit(&self, habit_id: &HabitId, changes: HabitChanges) -> Result<(), StorageError>;

    /// Soft delete a habit
    fn archive_habit(&self, habit_id: &HabitId) -> Result<(), StorageError> {
        self.update_habit(habit_id, HabitChanges::archived(true))
    }

    /// Reverse an archive
    fn unarchive_habit(&self, habit_id: &HabitId) -> Result<(), StorageError> {
        self.update_habit(habit_id, HabitChanges::archived(false))
    }

    /// Permanently remove a habit, its activities and every index entry
    /// pointing at it
    fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError>;

    /// Grant `friend` read access, updating both sides of the share index
    fn share_habit(&self, habit_id: &HabitId, friend: &UserId) -> Result<(), StorageError>;

    /// Revoke `friend`'s read access, updating both sides of the share index
    fn unshare_habit(&self, habit_id: &HabitId, friend: &UserId) -> Result<(), StorageError>;

    /// Users a habit is shared with
    fn get_shared_with(&self, habit_id: &HabitId) -> Result<BTreeSet<UserId>, StorageError>;

    /// Habits owned by `owner`, sorted by name
    fn get_my_habits(
        &self,
        owner: &UserId,
        limit: Option<usize>,
        include_archived: bool,
    ) -> Result<Vec<Habit>, StorageError>;

    /// Unarchived habits shared with `user`, sorted by name
    fn get_shared_habits(
        &self,
        user: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<Habit>, StorageError>;

    /// Log an outcome for a day, updating the existing entry for that day
    fn create_activity(
        &self,
        habit_id: &HabitId,
        date: NaiveDate,
        status: ActivityStatus,
    ) -> Result<ActivityId, StorageError>;

    /// Resolve the habit an activity id belongs to
    fn get_habit_from_activity(&self, activity_id: &ActivityId) -> Result<Habit, StorageError>;

    /// Remove a single activity
    fn delete_activity(
        &self,
        habit_id: &HabitId,
        activity_id: &ActivityId,
    ) -> Result<(), StorageError>;

    /// Activities logged in `[after, before)`, at most `limit` of them
    fn get_activities(
        &self,
        habit_id: &HabitId,
        after: NaiveDate,
        before: NaiveDate,
        limit: usize,
    ) -> Result<ActivityPage, StorageError>;

    /// Continuity score of a habit as of `today`
    fn get_score(&self, habit_id: &HabitId, today: NaiveDate) -> Result<u32, StorageError>;
}

/// Lets one store back several short-lived services, one per caller
impl<T: HabitStorage + ?Sized> HabitStorage for &T {
    fn create_habit(&self, habit: NewHabit) -> Result<HabitId, StorageError> {
        (**self).create_habit(habit)
    }

    fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError> {
        (**self).get_habit(habit_id)
    }

    fn update_habit(&self, habit_id: &HabitId, changes: HabitChanges) -> Result<(), StorageError> {
        (**self).update_habit(habit_id, changes)
    }

    fn archive_habit(&self, habit_id: &HabitId) -> Result<(), StorageError> {
        (**self).archive_habit(habit_id)
    }

    fn unarchive_habit(&self, habit_id: &HabitId) -> Result<(), StorageError> {
        (**self).unarchive_habit(habit_id)
    }

    fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError> {
        (**self).delete_habit(habit_id)
    }

    fn share_habit(&self, habit_id: &HabitId, friend: &UserId) -> Result<(), StorageError> {
        (**self).share_habit(habit_id, friend)
    }

    fn unshare_habit(&self, habit_id: &HabitId, friend: &UserId) -> Result<(), StorageError> {
        (**self).unshare_habit(habit_id, friend)
    }

    fn get_shared_with(&self, habit_id: &HabitId) -> Result<BTreeSet<UserId>, StorageError> {
        (**self).get_shared_with(habit_id)
    }

    fn get_my_habits(
        &self,
        owner: &UserId,
        limit: Option<usize>,
        include_archived: bool,
    ) -> Result<Vec<Habit>, StorageError> {
        (**self).get_my_habits(owner, limit, include_archived)
    }

    fn get_shared_habits(
        &self,
        user: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<Habit>, StorageError> {
        (**self).get_shared_habits(user, limit)
    }

    fn create_activity(
        &self,
        habit_id: &HabitId,
        date: NaiveDate,
        status: ActivityStatus,
    ) -> Result<ActivityId, StorageError> {
        (**self).create_activity(habit_id, date, status)
    }

    fn get_habit_from_activity(&self, activity_id: &ActivityId) -> Result<Habit, StorageError> {
        (**self).get_habit_from_activity(activity_id)
    }

    fn delete_activity(
        &self,
        habit_id: &HabitId,
        activity_id: &ActivityId,
    ) -> Result<(), StorageError> {
        (**self).delete_activity(habit_id, activity_id)
    }

    fn get_activities(
        &self,
        habit_id: &HabitId,
        after: NaiveDate,
        before: NaiveDate,
        limit: usize,
    ) -> Result<ActivityPage, StorageError> {
        (**self).get_activities(habit_id, after, before, limit)
    }

    fn get_score(&self, habit_id: &HabitId, today: NaiveDate) -> Result<u32, StorageError> {
        (**self).get_score(habit_id, today)
    }
}
