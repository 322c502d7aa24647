/// Store configuration
///
/// Where the data file lives and how long a loaded copy stays fresh.

use std::path::PathBuf;
use std::time::Duration;

/// How long a loaded document is trusted before a read reloads it
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(10);

/// Name of the data file inside the chosen data directory
pub const DATA_FILE_NAME: &str = "habits.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Backing document; `None` keeps everything in memory
    pub data_file: Option<PathBuf>,
    /// Cache freshness window
    pub freshness: Duration,
}

impl StoreConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            data_file: Some(path.into()),
            freshness: DEFAULT_FRESHNESS,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            data_file: None,
            freshness: DEFAULT_FRESHNESS,
        }
    }

    pub fn with_freshness(mut self, freshness: Duration) -> Self {
        self.freshness = freshness;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

/// Get the default data file path with robust fallback strategy
pub fn default_data_file() -> std::io::Result<PathBuf> {
    // Try various locations in order of preference
    let potential_dirs = [
        dirs::home_dir().map(|p| p.join(".habit_share")),
        dirs::data_dir().map(|p| p.join("habit_share")),
        dirs::config_dir().map(|p| p.join("habit_share")),
        std::env::current_dir().ok().map(|p| p.join(".habit_share")),
    ];

    for dir in potential_dirs.iter().flatten() {
        if std::fs::create_dir_all(dir).is_ok() {
            let probe = dir.join(".test_write");
            if std::fs::write(&probe, "test").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return Ok(dir.join(DATA_FILE_NAME));
            }
        }
    }

    let fallback = std::env::temp_dir().join("habit_share");
    std::fs::create_dir_all(&fallback)?;

    tracing::warn!("Using temporary directory for data file: {}", fallback.display());
    Ok(fallback.join(DATA_FILE_NAME))
}
