/// The persisted document
///
/// The entire store is one JSON document with two collections: the user index
/// and the habits, each habit carrying its own sorted activity log. Loading
/// verifies the cross-references so a corrupted file is rejected up front.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::domain::{Activity, ActivityId, Habit, HabitId, UserId};
use crate::storage::StorageError;

/// Per-user index entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntry {
    /// Habits this user owns
    #[serde(default)]
    pub my_habits: BTreeSet<HabitId>,
    /// Habits other users shared with this user
    #[serde(default)]
    pub shared_habits: BTreeSet<HabitId>,
}

/// A habit together with its activity log, sorted ascending by day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitRecord {
    #[serde(flatten)]
    pub habit: Habit,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl HabitRecord {
    pub fn new(habit: Habit) -> Self {
        Self {
            habit,
            activities: Vec::new(),
        }
    }
}

/// Full state of the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub users: BTreeMap<UserId, UserEntry>,
    #[serde(default)]
    pub habits: BTreeMap<HabitId, HabitRecord>,
}

impl StoreDocument {
    /// Read a document from disk
    ///
    /// A missing or empty file is an empty store.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let content = match fs::read(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No data file at {}, starting empty", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        if content.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Self::default());
        }

        let document: Self = serde_json::from_slice(&content)?;
        document.verify()?;
        Ok(document)
    }

    /// Replace the document on disk with this one
    ///
    /// The snapshot is written to a temporary file in the same directory and
    /// renamed over the target, so readers never observe a partial file.
    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(self)?;

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(parent)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600))?;
        }
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| StorageError::Io(e.error))?;

        Ok(())
    }

    /// Check every invariant that ties the collections together
    pub fn verify(&self) -> Result<(), StorageError> {
        for (habit_id, record) in &self.habits {
            let habit = &record.habit;
            if &habit.id != habit_id {
                return corrupted(format!("habit stored under {} has id {}", habit_id, habit.id));
            }

            let owned = self
                .users
                .get(&habit.owner)
                .is_some_and(|owner| owner.my_habits.contains(habit_id));
            if !owned {
                return corrupted(format!("habit {} missing from owner {}", habit_id, habit.owner));
            }

            for friend in &habit.shared_with {
                let listed = self
                    .users
                    .get(friend)
                    .is_some_and(|user| user.shared_habits.contains(habit_id));
                if !listed {
                    return corrupted(format!("habit {} shared with {} but not indexed", habit_id, friend));
                }
            }

            for activity in &record.activities {
                if &activity.habit_id != habit_id
                    || activity.id != ActivityId::encode(habit_id, activity.logged_date)
                {
                    return corrupted(format!("activity {} does not belong to {}", activity.id, habit_id));
                }
            }

            if !record
                .activities
                .windows(2)
                .all(|pair| pair[0].logged_date < pair[1].logged_date)
            {
                return corrupted(format!("activities of {} are not sorted by day", habit_id));
            }
        }

        for (user_id, user) in &self.users {
            for habit_id in &user.my_habits {
                let owns = self
                    .habits
                    .get(habit_id)
                    .is_some_and(|record| &record.habit.owner == user_id);
                if !owns {
                    return corrupted(format!("user {} lists unknown owned habit {}", user_id, habit_id));
                }
            }

            for habit_id in &user.shared_habits {
                let shared = self
                    .habits
                    .get(habit_id)
                    .is_some_and(|record| record.habit.shared_with.contains(user_id));
                if !shared {
                    return corrupted(format!("user {} lists unshared habit {}", user_id, habit_id));
                }
            }
        }

        Ok(())
    }

    /// Index entry for `user`, created on first use
    pub fn user_entry(&mut self, user: &UserId) -> &mut UserEntry {
        self.users.entry(user.clone()).or_default()
    }
}

fn corrupted(detail: String) -> Result<(), StorageError> {
    Err(StorageError::Corrupted { detail })
}
