/// File-backed implementation of the habit storage interface
///
/// All state lives in memory behind a single mutex and mirrors one JSON
/// document on disk. Every call reloads the document first if the cached
/// copy is older than the freshness window, and every mutation rewrites the
/// whole document. There is no write-ahead log and no partial update, which
/// is fine for a single-process store of modest size. Anything larger wants
/// an embedded key-value store or an append-only log behind this same trait.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use crate::config::StoreConfig;
use crate::domain::{
    calculate_score, Activity, ActivityId, ActivityStatus, DomainError, Habit, HabitChanges,
    HabitId, NewHabit, UserId,
};
use crate::storage::{ActivityPage, HabitRecord, HabitStorage, StorageError, StoreDocument};

/// Cached document plus the instant it was last read from disk
#[derive(Debug, Default)]
struct CachedState {
    last_loaded: Option<Instant>,
    document: StoreDocument,
}

/// File-backed storage
///
/// A reader/writer lock would not help: a read may itself reload the cache
/// and bump the load timestamp.
#[derive(Debug)]
pub struct FileStorage {
    path: Option<PathBuf>,
    freshness: Duration,
    state: Mutex<CachedState>,
}

impl FileStorage {
    /// Open the store described by `config`, loading the document eagerly so
    /// a corrupted file is reported at startup
    pub fn open(config: &StoreConfig) -> Result<Self, StorageError> {
        let storage = Self {
            path: config.data_file.clone(),
            freshness: config.freshness,
            state: Mutex::new(CachedState::default()),
        };

        if let Some(path) = &storage.path {
            let document = StoreDocument::load(path)?;
            tracing::info!(
                "File storage opened at {:?} with {} habits and {} users",
                path,
                document.habits.len(),
                document.users.len()
            );
            {
                let mut state = storage.lock()?;
                state.document = document;
                state.last_loaded = Some(Instant::now());
            }
        }

        Ok(storage)
    }

    /// A store that never touches disk
    pub fn in_memory() -> Self {
        Self::from_document(StoreDocument::default())
    }

    /// A memory-only store seeded with `document`
    pub fn from_document(document: StoreDocument) -> Self {
        Self {
            path: None,
            freshness: crate::config::DEFAULT_FRESHNESS,
            state: Mutex::new(CachedState {
                last_loaded: None,
                document,
            }),
        }
    }

    /// Location of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Deep copy of the current in-memory document
    pub fn snapshot(&self) -> Result<StoreDocument, StorageError> {
        let state = self.fresh()?;
        Ok(state.document.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, CachedState>, StorageError> {
        self.state.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Acquire the lock, reloading the document if the cache is stale
    fn fresh(&self) -> Result<MutexGuard<'_, CachedState>, StorageError> {
        let mut state = self.lock()?;

        if let Some(path) = &self.path {
            let stale = state
                .last_loaded
                .map_or(true, |loaded| loaded.elapsed() > self.freshness);
            if stale {
                tracing::debug!("Reloading {:?}", path);
                state.document = StoreDocument::load(path)?;
                state.last_loaded = Some(Instant::now());
            }
        }

        Ok(state)
    }

    /// Persist `staged` while still holding the lock, then install it as
    /// the cached document
    ///
    /// Mutations work on a copy of the cache, so a failed save leaves the
    /// cache exactly as it was before the call.
    fn commit(&self, state: &mut CachedState, staged: StoreDocument) -> Result<(), StorageError> {
        if let Some(path) = &self.path {
            staged.save(path)?;
            tracing::debug!("Wrote snapshot to {:?}", path);
        }
        state.document = staged;
        Ok(())
    }
}

/// Abort on a broken cross-reference
///
/// Such a state can only come from a bug in this module; continuing would
/// spread the damage into the next snapshot.
fn invariant_violation(detail: String) -> ! {
    tracing::error!("Store invariant violated: {}", detail);
    panic!("store invariant violated: {}", detail);
}

fn record<'a>(
    document: &'a StoreDocument,
    habit_id: &HabitId,
) -> Result<&'a HabitRecord, StorageError> {
    document
        .habits
        .get(habit_id)
        .ok_or_else(|| StorageError::habit_not_found(habit_id))
}

fn record_mut<'a>(
    document: &'a mut StoreDocument,
    habit_id: &HabitId,
) -> Result<&'a mut HabitRecord, StorageError> {
    document
        .habits
        .get_mut(habit_id)
        .ok_or_else(|| StorageError::habit_not_found(habit_id))
}

fn sort_and_limit(mut habits: Vec<Habit>, limit: Option<usize>) -> Vec<Habit> {
    habits.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    if let Some(limit) = limit {
        habits.truncate(limit);
    }
    habits
}

impl HabitStorage for FileStorage {
    fn create_habit(&self, habit: NewHabit) -> Result<HabitId, StorageError> {
        let mut state = self.fresh()?;
        let mut document = state.document.clone();

        let mut habit_id = HabitId::generate(&habit.owner);
        while document.habits.contains_key(&habit_id) {
            habit_id = HabitId::generate(&habit.owner);
        }

        let owner = habit.owner.clone();
        let habit = habit.into_habit(habit_id.clone());
        tracing::debug!("Created habit: {} ({})", habit.name, habit_id);

        document.habits.insert(habit_id.clone(), HabitRecord::new(habit));
        document.user_entry(&owner).my_habits.insert(habit_id.clone());

        self.commit(&mut state, document)?;
        Ok(habit_id)
    }

    fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError> {
        let state = self.fresh()?;
        Ok(record(&state.document, habit_id)?.habit.clone())
    }

    fn update_habit(&self, habit_id: &HabitId, changes: HabitChanges) -> Result<(), StorageError> {
        let mut state = self.fresh()?;
        let mut document = state.document.clone();

        let changed = record_mut(&mut document, habit_id)?.habit.apply(changes);
        if changed {
            tracing::debug!("Updated habit: {}", habit_id);
            self.commit(&mut state, document)?;
        }

        Ok(())
    }

    fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError> {
        let mut state = self.fresh()?;
        let mut document = state.document.clone();

        let habit = record(&document, habit_id)?.habit.clone();

        // Check every back-reference before touching anything
        if !document.users.contains_key(&habit.owner) {
            invariant_violation(format!("habit {} exists but owner {} does not", habit_id, habit.owner));
        }
        for friend in &habit.shared_with {
            if !document.users.contains_key(friend) {
                invariant_violation(format!("habit {} shared with missing user {}", habit_id, friend));
            }
        }

        for friend in &habit.shared_with {
            document.user_entry(friend).shared_habits.remove(habit_id);
        }
        document.user_entry(&habit.owner).my_habits.remove(habit_id);
        document.habits.remove(habit_id);

        tracing::debug!("Deleted habit: {} ({})", habit.name, habit_id);
        self.commit(&mut state, document)
    }

    fn share_habit(&self, habit_id: &HabitId, friend: &UserId) -> Result<(), StorageError> {
        let mut state = self.fresh()?;
        let mut document = state.document.clone();

        record_mut(&mut document, habit_id)?
            .habit
            .shared_with
            .insert(friend.clone());
        document.user_entry(friend).shared_habits.insert(habit_id.clone());

        tracing::debug!("Shared habit {} with {}", habit_id, friend);
        self.commit(&mut state, document)
    }

    fn unshare_habit(&self, habit_id: &HabitId, friend: &UserId) -> Result<(), StorageError> {
        let mut state = self.fresh()?;
        let mut document = state.document.clone();

        if !document.users.contains_key(friend) {
            return Err(StorageError::UserNotFound {
                user_id: friend.to_string(),
            });
        }

        record_mut(&mut document, habit_id)?.habit.shared_with.remove(friend);
        document.user_entry(friend).shared_habits.remove(habit_id);

        tracing::debug!("Unshared habit {} from {}", habit_id, friend);
        self.commit(&mut state, document)
    }

    fn get_shared_with(&self, habit_id: &HabitId) -> Result<BTreeSet<UserId>, StorageError> {
        let state = self.fresh()?;
        Ok(record(&state.document, habit_id)?.habit.shared_with.clone())
    }

    fn get_my_habits(
        &self,
        owner: &UserId,
        limit: Option<usize>,
        include_archived: bool,
    ) -> Result<Vec<Habit>, StorageError> {
        let state = self.fresh()?;
        let document = &state.document;

        // Users appear lazily, so an unknown owner simply has nothing yet
        let Some(user) = document.users.get(owner) else {
            return Ok(Vec::new());
        };

        let mut habits = Vec::with_capacity(user.my_habits.len());
        for habit_id in &user.my_habits {
            let Some(record) = document.habits.get(habit_id) else {
                invariant_violation(format!("user {} owns missing habit {}", owner, habit_id));
            };
            if include_archived || !record.habit.archived {
                habits.push(record.habit.clone());
            }
        }

        Ok(sort_and_limit(habits, limit))
    }

    fn get_shared_habits(
        &self,
        user: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<Habit>, StorageError> {
        let state = self.fresh()?;
        let document = &state.document;

        let Some(entry) = document.users.get(user) else {
            return Ok(Vec::new());
        };

        let mut habits = Vec::with_capacity(entry.shared_habits.len());
        for habit_id in &entry.shared_habits {
            let Some(record) = document.habits.get(habit_id) else {
                invariant_violation(format!("habit {} shared with {} does not exist", habit_id, user));
            };
            if !record.habit.archived {
                habits.push(record.habit.clone());
            }
        }

        Ok(sort_and_limit(habits, limit))
    }

    fn create_activity(
        &self,
        habit_id: &HabitId,
        date: NaiveDate,
        status: ActivityStatus,
    ) -> Result<ActivityId, StorageError> {
        let mut state = self.fresh()?;
        let mut document = state.document.clone();
        let activities = &mut record_mut(&mut document, habit_id)?.activities;
        let activity_id = ActivityId::encode(habit_id, date);

        // Linear in the size of the log
        match activities.iter_mut().find(|a| a.id == activity_id) {
            Some(existing) if existing.status == status => return Ok(activity_id),
            Some(existing) => existing.status = status,
            None => {
                activities.push(Activity::new(habit_id.clone(), date, status));
                activities.sort_by_key(|a| a.logged_date);
            }
        }

        tracing::debug!("Logged activity {} as {}", activity_id, status);
        self.commit(&mut state, document)?;
        Ok(activity_id)
    }

    fn get_habit_from_activity(&self, activity_id: &ActivityId) -> Result<Habit, StorageError> {
        let (habit_id, _) = activity_id.decode()?;
        self.get_habit(&habit_id)
    }

    fn delete_activity(
        &self,
        habit_id: &HabitId,
        activity_id: &ActivityId,
    ) -> Result<(), StorageError> {
        let (derived_habit_id, date) = activity_id.decode()?;
        if &derived_habit_id != habit_id {
            return Err(DomainError::InvalidActivityId(format!(
                "habitId={} activityId={}",
                habit_id, activity_id
            ))
            .into());
        }

        let mut state = self.fresh()?;
        let mut document = state.document.clone();
        let activities = &mut record_mut(&mut document, habit_id)?.activities;

        let index = activities.partition_point(|a| a.logged_date < date);
        if activities.get(index).map(|a| &a.id) != Some(activity_id) {
            return Err(StorageError::ActivityNotFound {
                activity_id: activity_id.to_string(),
            });
        }
        activities.remove(index);

        tracing::debug!("Deleted activity {}", activity_id);
        self.commit(&mut state, document)
    }

    fn get_activities(
        &self,
        habit_id: &HabitId,
        after: NaiveDate,
        before: NaiveDate,
        limit: usize,
    ) -> Result<ActivityPage, StorageError> {
        if before < after {
            return Err(DomainError::InvalidRange {
                after: after.to_string(),
                before: before.to_string(),
            }
            .into());
        }

        let state = self.fresh()?;
        let activities = &record(&state.document, habit_id)?.activities;

        let left = activities.partition_point(|a| a.logged_date < after);
        let mut right = activities.partition_point(|a| a.logged_date < before);

        let has_more = right - left > limit;
        if has_more {
            right = left + limit;
        }

        Ok(ActivityPage {
            activities: activities[left..right].to_vec(),
            has_more,
        })
    }

    fn get_score(&self, habit_id: &HabitId, today: NaiveDate) -> Result<u32, StorageError> {
        let state = self.fresh()?;
        let record = record(&state.document, habit_id)?;
        Ok(calculate_score(&record.activities, record.habit.frequency, today))
    }
}
