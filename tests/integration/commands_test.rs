//! Command Boundary Integration Tests
//!
//! Exercise the commands the UI calls, over an `AppState` initialized in a
//! temporary directory.

use slim_leaderboard_core::{AnalysisRequest, NoopSink, RunState};
use slim_leaderboard_desktop::commands;
use slim_leaderboard_desktop::{AppState, SettingsUpdate};
use tempfile::TempDir;

async fn initialized_state() -> (AppState, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let state = AppState::new();
    state.initialize_in(dir.path()).await.unwrap();
    (state, dir)
}

// ============================================================================
// Credential Commands
// ============================================================================

#[tokio::test]
async fn test_token_commands() {
    let (state, _dir) = initialized_state().await;

    assert!(commands::clear_token(&state).await.success);
    assert!(!commands::has_token(&state).await);

    let saved = commands::save_token(&state, "  ghp_trimmed  ".to_string()).await;
    assert!(saved.success);
    assert_eq!(
        commands::get_token(&state).await.data.as_deref(),
        Some("ghp_trimmed")
    );
}

#[tokio::test]
async fn test_token_is_not_stored_in_plaintext() {
    let (state, dir) = initialized_state().await;
    commands::save_token(&state, "ghp_plaintext_check".to_string()).await;

    let needle = b"ghp_plaintext_check";
    for name in ["data.db", "data.db-wal"] {
        let Ok(bytes) = std::fs::read(dir.path().join(name)) else {
            continue;
        };
        assert!(
            !bytes.windows(needle.len()).any(|window| window == needle),
            "plaintext token found in {name}"
        );
    }
}

// ============================================================================
// Analysis Commands
// ============================================================================

#[tokio::test]
async fn test_run_without_token_returns_failed_outcome() {
    let (state, _dir) = initialized_state().await;

    let response = commands::run_analysis(
        &state,
        AnalysisRequest::repository("https://github.com/acme/widget"),
        &NoopSink,
    )
    .await;

    assert!(!response.success);
    let outcome = response.data.unwrap();
    assert!(!outcome.success);
    assert_eq!(
        outcome.error_message.as_deref(),
        Some("GitHub token not configured. Please set it in Settings.")
    );
    assert_eq!(
        commands::get_run_state(&state).await.data,
        Some(RunState::Failed)
    );
}

#[tokio::test]
async fn test_run_with_invalid_target_returns_failed_outcome() {
    let (state, _dir) = initialized_state().await;
    commands::save_token(&state, "ghp_x".to_string()).await;

    let response = commands::run_analysis(
        &state,
        AnalysisRequest::repository("https://github.com/acme"),
        &NoopSink,
    )
    .await;

    assert!(!response.success);
    assert!(response.error.unwrap().starts_with("Invalid repository URL"));
    assert_eq!(commands::get_last_analysis(&state).await.data, Some(None));
}

// ============================================================================
// Settings and Health
// ============================================================================

#[tokio::test]
async fn test_settings_update_reaches_probe() {
    let (state, _dir) = initialized_state().await;

    let response = commands::update_settings(
        &state,
        SettingsUpdate {
            python_path: Some("missing-python-31f7".to_string()),
            run_timeout_secs: Some(600),
            ..Default::default()
        },
    )
    .await;
    assert!(response.success);
    assert_eq!(response.data.unwrap().run_timeout_secs, Some(600));

    let runtime = commands::check_runtime(&state).await;
    assert!(!runtime.success);
    assert!(runtime.error.unwrap().contains("missing-python-31f7"));
}

#[tokio::test]
async fn test_health_after_init() {
    let (state, _dir) = initialized_state().await;
    let health = commands::get_health(&state).await.data.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.service, "slim-leaderboard-desktop");
}
