//! Cross-Platform Path Utilities
//!
//! Functions for resolving application directories across platforms.
//! Everything the app persists lives under ~/.slim-leaderboard/.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the application directory (~/.slim-leaderboard/)
pub fn app_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".slim-leaderboard"))
}

/// Get the config file path (~/.slim-leaderboard/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(app_dir()?.join("config.json"))
}

/// Get the database file path (~/.slim-leaderboard/data.db)
pub fn database_path() -> AppResult<PathBuf> {
    Ok(app_dir()?.join("data.db"))
}

/// Get the secret key file path (~/.slim-leaderboard/secret.key)
pub fn secret_key_path() -> AppResult<PathBuf> {
    Ok(app_dir()?.join("secret.key"))
}

/// Default directory for per-run scratch files
pub fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir()
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Get the application directory, creating if it doesn't exist
pub fn ensure_app_dir() -> AppResult<PathBuf> {
    let path = app_dir()?;
    ensure_dir(&path)?;
    Ok(path)
}
