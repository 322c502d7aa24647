/// The habit sharing service
///
/// Owner-only operations answer `PermissionDenied` to anyone else. Reads that
/// sharers may perform answer `HabitNotFound` to outsiders instead, so an
/// unauthorized caller cannot confirm that a habit exists.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};

use crate::app::AppError;
use crate::auth::IdentityResolver;
use crate::domain::{
    ActivityId, ActivityStatus, DomainError, Frequency, Habit, HabitChanges, HabitId, NewHabit,
    UserId,
};
use crate::storage::{ActivityPage, HabitStorage};

/// Permission-checked front of a storage backend
pub struct HabitApp<S, I> {
    storage: S,
    identity: I,
}

impl<S: HabitStorage, I: IdentityResolver> HabitApp<S, I> {
    pub fn new(storage: S, identity: I) -> Self {
        Self { storage, identity }
    }

    /// The storage layer, bypassing permission checks
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn current_user(&self) -> Result<UserId, AppError> {
        self.identity.current_user().ok_or(AppError::UserNotFound)
    }

    /// Fetch a habit the caller must own
    fn owned_habit(&self, user: &UserId, habit_id: &HabitId) -> Result<Habit, AppError> {
        let habit = self.storage.get_habit(habit_id)?;
        if !habit.is_owned_by(user) {
            tracing::warn!("User {} denied write access to habit {}", user, habit_id);
            return Err(AppError::PermissionDenied);
        }
        Ok(habit)
    }

    /// Fetch a habit the caller owns or has been shared
    fn visible_habit(&self, user: &UserId, habit_id: &HabitId) -> Result<Habit, AppError> {
        let habit = self.storage.get_habit(habit_id)?;
        if !habit.is_visible_to(user) {
            tracing::warn!("User {} denied read access to habit {}", user, habit_id);
            return Err(AppError::HabitNotFound {
                habit_id: habit_id.to_string(),
            });
        }
        Ok(habit)
    }

    // Habit management

    /// Create a habit owned by the caller
    pub fn create_habit(
        &self,
        name: &str,
        description: &str,
        frequency: i64,
    ) -> Result<HabitId, AppError> {
        let owner = self.current_user()?;
        let habit = NewHabit::new(
            owner,
            name.to_string(),
            description.to_string(),
            Frequency::new(frequency)?,
        )?;

        Ok(self.storage.create_habit(habit)?)
    }

    pub fn change_name(&self, habit_id: &HabitId, name: &str) -> Result<(), AppError> {
        let user = self.current_user()?;
        let changes = HabitChanges::name(name.to_string())?;
        self.owned_habit(&user, habit_id)?;

        Ok(self.storage.update_habit(habit_id, changes)?)
    }

    pub fn change_description(&self, habit_id: &HabitId, description: &str) -> Result<(), AppError> {
        let user = self.current_user()?;
        self.owned_habit(&user, habit_id)?;

        Ok(self
            .storage
            .update_habit(habit_id, HabitChanges::description(description.to_string()))?)
    }

    pub fn change_frequency(&self, habit_id: &HabitId, frequency: i64) -> Result<(), AppError> {
        let user = self.current_user()?;
        let frequency = Frequency::new(frequency)?;
        self.owned_habit(&user, habit_id)?;

        Ok(self
            .storage
            .update_habit(habit_id, HabitChanges::frequency(frequency))?)
    }

    pub fn archive_habit(&self, habit_id: &HabitId) -> Result<(), AppError> {
        let user = self.current_user()?;
        self.owned_habit(&user, habit_id)?;

        Ok(self.storage.archive_habit(habit_id)?)
    }

    pub fn unarchive_habit(&self, habit_id: &HabitId) -> Result<(), AppError> {
        let user = self.current_user()?;
        self.owned_habit(&user, habit_id)?;

        Ok(self.storage.unarchive_habit(habit_id)?)
    }

    /// Permanently delete a habit and everything pointing at it
    pub fn delete_habit(&self, habit_id: &HabitId) -> Result<(), AppError> {
        let user = self.current_user()?;
        self.owned_habit(&user, habit_id)?;

        Ok(self.storage.delete_habit(habit_id)?)
    }

    pub fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, AppError> {
        let user = self.current_user()?;
        self.visible_habit(&user, habit_id)
    }

    /// Habits the caller owns, sorted by name
    pub fn get_my_habits(
        &self,
        limit: Option<usize>,
        include_archived: bool,
    ) -> Result<Vec<Habit>, AppError> {
        let user = self.current_user()?;
        Ok(self.storage.get_my_habits(&user, limit, include_archived)?)
    }

    /// Unarchived habits other users shared with the caller
    pub fn get_shared_habits(&self, limit: Option<usize>) -> Result<Vec<Habit>, AppError> {
        let user = self.current_user()?;
        Ok(self.storage.get_shared_habits(&user, limit)?)
    }

    // Sharing

    pub fn share_habit(&self, habit_id: &HabitId, friend: &str) -> Result<(), AppError> {
        let user = self.current_user()?;
        let habit = self.owned_habit(&user, habit_id)?;
        let friend = share_target(&habit, friend)?;

        Ok(self.storage.share_habit(habit_id, &friend)?)
    }

    pub fn unshare_habit(&self, habit_id: &HabitId, friend: &str) -> Result<(), AppError> {
        let user = self.current_user()?;
        let habit = self.owned_habit(&user, habit_id)?;
        let friend = share_target(&habit, friend)?;

        Ok(self.storage.unshare_habit(habit_id, &friend)?)
    }

    pub fn get_shared_with(&self, habit_id: &HabitId) -> Result<BTreeSet<UserId>, AppError> {
        let user = self.current_user()?;
        self.visible_habit(&user, habit_id)?;

        Ok(self.storage.get_shared_with(habit_id)?)
    }

    // Activities

    /// Log a day's outcome; logging the same day again updates it
    pub fn create_activity(
        &self,
        habit_id: &HabitId,
        date: NaiveDate,
        status: &str,
    ) -> Result<ActivityId, AppError> {
        let user = self.current_user()?;
        let status: ActivityStatus = status.parse()?;
        self.owned_habit(&user, habit_id)?;

        Ok(self.storage.create_activity(habit_id, date, status)?)
    }

    /// Delete an activity by id alone; the habit is derived from the id
    pub fn delete_activity(&self, activity_id: &str) -> Result<(), AppError> {
        let user = self.current_user()?;
        let activity_id = ActivityId::parse(activity_id)?;

        let habit = self.storage.get_habit_from_activity(&activity_id)?;
        if !habit.is_owned_by(&user) {
            tracing::warn!("User {} denied write access to habit {}", user, habit.id);
            return Err(AppError::PermissionDenied);
        }

        Ok(self.storage.delete_activity(&habit.id, &activity_id)?)
    }

    /// Activities logged in `[after, before)`
    pub fn get_activities(
        &self,
        habit_id: &HabitId,
        after: NaiveDate,
        before: NaiveDate,
        limit: usize,
    ) -> Result<ActivityPage, AppError> {
        let user = self.current_user()?;
        self.visible_habit(&user, habit_id)?;

        Ok(self.storage.get_activities(habit_id, after, before, limit)?)
    }

    /// Continuity score as of today (UTC)
    pub fn get_score(&self, habit_id: &HabitId) -> Result<u32, AppError> {
        self.get_score_on(habit_id, Utc::now().date_naive())
    }

    /// Continuity score as of `today`
    pub fn get_score_on(&self, habit_id: &HabitId, today: NaiveDate) -> Result<u32, AppError> {
        let user = self.current_user()?;
        self.visible_habit(&user, habit_id)?;

        Ok(self.storage.get_score(habit_id, today)?)
    }
}

/// A habit may be shared with anyone but its own owner
fn share_target(habit: &Habit, friend: &str) -> Result<UserId, DomainError> {
    let friend = UserId::new(friend);
    if friend.as_str().is_empty() || habit.is_owned_by(&friend) {
        return Err(DomainError::InvalidUser(friend.to_string()));
    }
    Ok(friend)
}
