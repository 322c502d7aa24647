/// Permission-checked application service
///
/// The single entry point callers use. It resolves who is calling, enforces
/// ownership and sharing rules, validates input and only then delegates to a
/// storage backend.

pub mod service;

pub use service::*;

use thiserror::Error;

use crate::domain::DomainError;
use crate::storage::StorageError;

/// Errors surfaced to callers of the service
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Habit could not be found: {habit_id}")]
    HabitNotFound { habit_id: String },

    #[error("Activity could not be found: {activity_id}")]
    ActivityNotFound { activity_id: String },

    #[error("User could not be found")]
    UserNotFound,

    #[error("Operation was denied")]
    PermissionDenied,

    #[error("Failed to parse input: {0}")]
    Input(#[from] DomainError),

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

/// Coarse error categories callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    HabitNotFound,
    ActivityNotFound,
    UserNotFound,
    PermissionDenied,
    Input,
    /// I/O, serialization or corruption in the storage layer
    Internal,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::HabitNotFound { .. } => ErrorKind::HabitNotFound,
            AppError::ActivityNotFound { .. } => ErrorKind::ActivityNotFound,
            AppError::UserNotFound => ErrorKind::UserNotFound,
            AppError::PermissionDenied => ErrorKind::PermissionDenied,
            AppError::Input(_) => ErrorKind::Input,
            AppError::Storage(_) => ErrorKind::Internal,
        }
    }
}

/// Lift the storage layer's not-found and input errors so both layers share
/// one taxonomy; everything else stays wrapped and untouched.
impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::HabitNotFound { habit_id } => AppError::HabitNotFound { habit_id },
            StorageError::ActivityNotFound { activity_id } => {
                AppError::ActivityNotFound { activity_id }
            }
            StorageError::UserNotFound { .. } => AppError::UserNotFound,
            StorageError::Input(e) => AppError::Input(e),
            other => AppError::Storage(other),
        }
    }
}
