/// Domain module containing core business logic and data types
///
/// This module defines the core entities (Habit, Activity) and their
/// validation rules, the activity identifier codec and the weekly
/// continuity score.

pub mod habit;
pub mod activity;
pub mod score;
pub mod types;

// Re-export public types for easy access
pub use habit::*;
pub use activity::*;
pub use score::*;
pub use types::*;

use thiserror::Error;

/// Input rejected by domain validation
///
/// Every variant carries the raw offending input so callers can report
/// exactly what failed to parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid frequency, expected 1-7 but input was {0}")]
    InvalidFrequency(String),

    #[error("Invalid activity status: {0}")]
    InvalidStatus(String),

    #[error("Invalid activity id: {0}")]
    InvalidActivityId(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid range: before={before} after={after}")]
    InvalidRange { after: String, before: String },

    #[error("Invalid habit name: {0:?}")]
    InvalidName(String),

    #[error("Invalid user: {0:?}")]
    InvalidUser(String),
}

impl DomainError {
    /// The raw input that failed validation
    pub fn raw_input(&self) -> String {
        match self {
            DomainError::InvalidFrequency(input)
            | DomainError::InvalidStatus(input)
            | DomainError::InvalidActivityId(input)
            | DomainError::InvalidDate(input)
            | DomainError::InvalidName(input)
            | DomainError::InvalidUser(input) => input.clone(),
            DomainError::InvalidRange { after, before } => {
                format!("before={} after={}", before, after)
            }
        }
    }
}
