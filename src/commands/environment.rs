//! Environment Commands
//!
//! Interpreter checks and dependency installation for the leaderboard tool.

use slim_leaderboard_core::ProgressSink;

use crate::models::response::CommandResponse;
use crate::services::analysis::RuntimeInfo;
use crate::state::AppState;

/// Check that the configured Python interpreter runs and report its version
pub async fn check_runtime(state: &AppState) -> CommandResponse<RuntimeInfo> {
    match state.environment_probe().await {
        Ok(probe) => probe.check_runtime().await.into(),
        Err(e) => CommandResponse::err(e.to_string()),
    }
}

/// Install the tool's Python requirements
pub async fn install_dependencies(state: &AppState, sink: &dyn ProgressSink) -> CommandResponse<()> {
    match state.environment_probe().await {
        Ok(probe) => probe.install_dependencies(sink).await.into(),
        Err(e) => CommandResponse::err(e.to_string()),
    }
}
