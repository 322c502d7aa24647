/// Public library interface for the habit sharing core
///
/// This module exports the permission-checked service, the storage contract
/// with its file-backed implementation, and the domain types they share.

// Internal modules
pub mod app;
pub mod auth;
pub mod config;
pub mod domain;
pub mod storage;

// Re-export public modules and types
pub use app::{AppError, ErrorKind, HabitApp};
pub use auth::{IdentityResolver, StaticIdentity};
pub use config::{default_data_file, StoreConfig, DEFAULT_FRESHNESS};
pub use domain::*;
pub use storage::{
    ActivityPage, FileStorage, HabitRecord, HabitStorage, StorageError, StoreDocument, UserEntry,
};

/// Open a file-backed service acting on behalf of `identity`
pub fn open<I: IdentityResolver>(
    config: &StoreConfig,
    identity: I,
) -> Result<HabitApp<FileStorage, I>, StorageError> {
    tracing::info!("Initializing habit store: {:?}", config.data_file);
    let storage = FileStorage::open(config)?;
    Ok(HabitApp::new(storage, identity))
}
