//! Credential Commands
//!
//! Save, read and clear the GitHub token used by the leaderboard tool.

use crate::models::response::CommandResponse;
use crate::state::AppState;

/// Store the GitHub token, replacing any existing one
pub async fn save_token(state: &AppState, token: String) -> CommandResponse<()> {
    match state.credentials().await {
        Ok(store) => store.set_token(&token).into(),
        Err(e) => CommandResponse::err(e.to_string()),
    }
}

/// Read the token for the settings dialog; empty when none is stored
pub async fn get_token(state: &AppState) -> CommandResponse<String> {
    match state.credentials().await {
        Ok(store) => store.get_token().map(Option::unwrap_or_default).into(),
        Err(e) => CommandResponse::err(e.to_string()),
    }
}

pub async fn has_token(state: &AppState) -> bool {
    match state.credentials().await {
        Ok(store) => store.has_token(),
        Err(_) => false,
    }
}

/// Remove the token. Succeeds when none is stored.
pub async fn clear_token(state: &AppState) -> CommandResponse<()> {
    match state.credentials().await {
        Ok(store) => store.clear_token().into(),
        Err(e) => CommandResponse::err(e.to_string()),
    }
}
