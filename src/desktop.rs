//! Desktop Shell
//!
//! Tauri IPC wrappers over the command layer, window-event progress sinks and
//! the application entry point. Compiled only with the `desktop` feature.

use tauri::{AppHandle, Emitter, State};
use tauri_plugin_shell::ShellExt;
use tracing_subscriber::EnvFilter;

use slim_leaderboard_core::{
    AnalysisRequest, LastAnalysisRecord, ProgressEvent, ProgressSink, RunOutcome, RunState,
};

use crate::commands;
use crate::commands::InitResult;
use crate::models::response::{CommandResponse, HealthResponse};
use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::services::analysis::RuntimeInfo;
use crate::state::AppState;
use crate::utils::error::AppError;

/// Window event carrying analysis progress
pub const ANALYSIS_PROGRESS_EVENT: &str = "analysis-progress";
/// Window event carrying dependency installation progress
pub const INSTALL_PROGRESS_EVENT: &str = "install-progress";

/// Emits progress as a Tauri event to every window
struct TauriProgressSink {
    app: AppHandle,
    event: &'static str,
}

impl ProgressSink for TauriProgressSink {
    fn emit(&self, event: ProgressEvent) {
        if let Err(e) = self.app.emit(self.event, &event) {
            tracing::debug!("Dropped {} event: {}", self.event, e);
        }
    }
}

// ── Initialization ─────────────────────────────────────────────────────

#[tauri::command]
async fn init_app(state: State<'_, AppState>) -> Result<CommandResponse<InitResult>, String> {
    Ok(commands::init_app(state.inner()).await)
}

#[tauri::command]
fn get_version() -> CommandResponse<String> {
    commands::get_version()
}

#[tauri::command]
async fn get_health(state: State<'_, AppState>) -> Result<CommandResponse<HealthResponse>, String> {
    Ok(commands::get_health(state.inner()).await)
}

// ── Settings ───────────────────────────────────────────────────────────

#[tauri::command]
async fn get_settings(state: State<'_, AppState>) -> Result<CommandResponse<AppConfig>, String> {
    Ok(commands::get_settings(state.inner()).await)
}

#[tauri::command]
async fn update_settings(
    state: State<'_, AppState>,
    update: SettingsUpdate,
) -> Result<CommandResponse<AppConfig>, String> {
    Ok(commands::update_settings(state.inner(), update).await)
}

// ── Credentials ────────────────────────────────────────────────────────

#[tauri::command]
async fn save_token(
    state: State<'_, AppState>,
    token: String,
) -> Result<CommandResponse<()>, String> {
    Ok(commands::save_token(state.inner(), token).await)
}

#[tauri::command]
async fn get_token(state: State<'_, AppState>) -> Result<CommandResponse<String>, String> {
    Ok(commands::get_token(state.inner()).await)
}

#[tauri::command]
async fn has_token(state: State<'_, AppState>) -> Result<bool, String> {
    Ok(commands::has_token(state.inner()).await)
}

#[tauri::command]
async fn clear_token(state: State<'_, AppState>) -> Result<CommandResponse<()>, String> {
    Ok(commands::clear_token(state.inner()).await)
}

// ── Analysis ───────────────────────────────────────────────────────────

#[tauri::command]
async fn run_analysis(
    app: AppHandle,
    state: State<'_, AppState>,
    request: AnalysisRequest,
) -> Result<CommandResponse<RunOutcome>, String> {
    let sink = TauriProgressSink {
        app,
        event: ANALYSIS_PROGRESS_EVENT,
    };
    Ok(commands::run_analysis(state.inner(), request, &sink).await)
}

#[tauri::command]
async fn get_last_analysis(
    state: State<'_, AppState>,
) -> Result<CommandResponse<Option<LastAnalysisRecord>>, String> {
    Ok(commands::get_last_analysis(state.inner()).await)
}

#[tauri::command]
async fn get_run_state(state: State<'_, AppState>) -> Result<CommandResponse<RunState>, String> {
    Ok(commands::get_run_state(state.inner()).await)
}

// ── Environment ────────────────────────────────────────────────────────

#[tauri::command]
async fn check_runtime(state: State<'_, AppState>) -> Result<CommandResponse<RuntimeInfo>, String> {
    Ok(commands::check_runtime(state.inner()).await)
}

#[tauri::command]
async fn install_dependencies(
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<CommandResponse<()>, String> {
    let sink = TauriProgressSink {
        app,
        event: INSTALL_PROGRESS_EVENT,
    };
    Ok(commands::install_dependencies(state.inner(), &sink).await)
}

// ── Shell ──────────────────────────────────────────────────────────────

// `Shell::open` is deprecated upstream in favour of the opener plugin
#[allow(deprecated)]
#[tauri::command]
fn open_external(app: AppHandle, url: String) -> CommandResponse<()> {
    commands::open_external(&url, |link| {
        app.shell()
            .open(link, None)
            .map_err(|e| AppError::internal(format!("Failed to open link: {}", e)))
    })
}

/// Install the log subscriber and run the desktop application
pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let result = tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .manage(AppState::new())
        .invoke_handler(tauri::generate_handler![
            // Initialization commands
            init_app,
            get_version,
            get_health,
            // Settings commands
            get_settings,
            update_settings,
            // Credential commands
            save_token,
            get_token,
            has_token,
            clear_token,
            // Analysis commands
            run_analysis,
            get_last_analysis,
            get_run_state,
            // Environment commands
            check_runtime,
            install_dependencies,
            // Shell commands
            open_external,
        ])
        .run(tauri::generate_context!());

    if let Err(e) = result {
        tracing::error!("Error while running SLIM Leaderboard: {}", e);
        std::process::exit(1);
    }
}
