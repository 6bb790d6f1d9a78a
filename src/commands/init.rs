//! Initialization Commands
//!
//! Commands for application initialization and setup.

use serde::{Deserialize, Serialize};

use crate::models::response::CommandResponse;
use crate::state::AppState;

/// Result of application initialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitResult {
    pub message: String,
    /// Whether a GitHub token is already stored
    pub has_token: bool,
    /// Whether a previous analysis can be shown
    pub has_last_analysis: bool,
}

/// Initialize the application on startup
pub async fn init_app(state: &AppState) -> CommandResponse<InitResult> {
    if let Err(e) = state.initialize().await {
        tracing::error!("Initialization failed: {}", e);
        return CommandResponse::err(e.to_string());
    }
    summarize(state).await
}

async fn summarize(state: &AppState) -> CommandResponse<InitResult> {
    match state.credentials().await {
        Ok(store) => CommandResponse::ok(InitResult {
            message: "Application initialized successfully".to_string(),
            has_token: store.has_token(),
            has_last_analysis: store.get_last_analysis().is_some(),
        }),
        Err(e) => CommandResponse::err(e.to_string()),
    }
}

/// Get the application version
pub fn get_version() -> CommandResponse<String> {
    CommandResponse::ok(env!("CARGO_PKG_VERSION").to_string())
}
