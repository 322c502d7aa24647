/// Habit entity and related functionality
///
/// This module defines the Habit struct that represents a recurring task a
/// user tracks, the NewHabit request used to create one in a single step and
/// the HabitChanges set applied by the field mutators.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, Frequency, HabitId, UserId};

/// A recurring task tracked against a target weekly frequency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    /// Unique identifier for this habit
    pub id: HabitId,
    /// The user who created the habit; only they may modify it
    pub owner: UserId,
    /// Display name (e.g., "Morning Run")
    pub name: String,
    /// Free-form description, empty when not provided
    #[serde(default)]
    pub description: String,
    /// Qualifying days per week needed to keep a streak alive
    pub frequency: Frequency,
    /// Soft-deleted habits are hidden from default listings
    #[serde(default)]
    pub archived: bool,
    /// Users granted read access
    #[serde(default)]
    pub shared_with: BTreeSet<UserId>,
}

impl Habit {
    /// Whether `user` owns this habit
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner == user
    }

    /// Whether `user` may read this habit (owner or sharer)
    pub fn is_visible_to(&self, user: &UserId) -> bool {
        self.is_owned_by(user) || self.shared_with.contains(user)
    }

    /// Apply a validated change set
    ///
    /// Returns whether anything actually changed.
    pub fn apply(&mut self, changes: HabitChanges) -> bool {
        let before = (
            self.name.clone(),
            self.description.clone(),
            self.frequency,
            self.archived,
        );

        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(frequency) = changes.frequency {
            self.frequency = frequency;
        }
        if let Some(archived) = changes.archived {
            self.archived = archived;
        }

        before != (
            self.name.clone(),
            self.description.clone(),
            self.frequency,
            self.archived,
        )
    }
}

/// Everything needed to create a fully-formed habit in one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    pub owner: UserId,
    pub name: String,
    pub description: String,
    pub frequency: Frequency,
}

impl NewHabit {
    /// Create a new habit request with validation
    pub fn new(
        owner: UserId,
        name: String,
        description: String,
        frequency: Frequency,
    ) -> Result<Self, DomainError> {
        validate_name(&name)?;

        Ok(Self {
            owner,
            name,
            description,
            frequency,
        })
    }

    /// Materialize the habit under a freshly generated id
    pub fn into_habit(self, id: HabitId) -> Habit {
        Habit {
            id,
            owner: self.owner,
            name: self.name,
            description: self.description,
            frequency: self.frequency,
            archived: false,
            shared_with: BTreeSet::new(),
        }
    }
}

/// Partial update of a habit's mutable fields
///
/// Ownership and sharing are deliberately absent; they change only through
/// the share operations so both sides of the index stay consistent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<Frequency>,
    pub archived: Option<bool>,
}

impl HabitChanges {
    pub fn name(name: String) -> Result<Self, DomainError> {
        validate_name(&name)?;
        Ok(Self {
            name: Some(name),
            ..Self::default()
        })
    }

    pub fn description(description: String) -> Self {
        Self {
            description: Some(description),
            ..Self::default()
        }
    }

    pub fn frequency(frequency: Frequency) -> Self {
        Self {
            frequency: Some(frequency),
            ..Self::default()
        }
    }

    pub fn archived(archived: bool) -> Self {
        Self {
            archived: Some(archived),
            ..Self::default()
        }
    }
}

/// Habit names must contain something other than whitespace
fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::InvalidName(name.to_string()));
    }
    Ok(())
}
