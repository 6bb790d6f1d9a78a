//! SLIM Leaderboard Desktop - Rust Backend Library
//!
//! Backend for a desktop front-end that runs the SLIM leaderboard tool
//! against a GitHub repository or organization. It includes:
//! - Command handlers forming the request/response boundary for the UI
//! - The analysis services (job configs, process supervision, orchestration)
//! - Storage layer (SQLite, encrypted secrets, JSON config)
//! - Data models and utilities
//!
//! The Tauri shell lives in [`desktop`] behind the `desktop` feature.

pub mod commands;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

#[cfg(feature = "desktop")]
pub mod desktop;

// Re-export commonly used items from commands
pub use commands::{
    // Init commands
    init_app, get_version,
    // Health commands
    get_health,
    // Settings commands
    get_settings, update_settings,
    // Credential commands
    save_token, get_token, has_token, clear_token,
    // Analysis commands
    run_analysis, get_last_analysis, get_run_state,
    // Environment commands
    check_runtime, install_dependencies,
    // Shell commands
    open_external,
};
// Re-export models (avoiding settings module conflict)
pub use models::response::*;
pub use models::settings::{AppConfig, SettingsUpdate};
pub use state::AppState;
pub use utils::error::{AppError, AppResult};
