//! Analysis Commands
//!
//! Run the leaderboard tool and read back the last successful result.

use slim_leaderboard_core::{
    AnalysisRequest, LastAnalysisRecord, ProgressSink, RunOutcome, RunState,
};

use crate::models::response::CommandResponse;
use crate::state::AppState;

/// Run one analysis. Progress is delivered to `sink` while the call is pending.
///
/// Every failure, including ones detected before launch, resolves as an
/// unsuccessful outcome.
pub async fn run_analysis(
    state: &AppState,
    request: AnalysisRequest,
    sink: &dyn ProgressSink,
) -> CommandResponse<RunOutcome> {
    let started_at = chrono::Utc::now().to_rfc3339();
    let result = match state.orchestrator().await {
        Ok(orchestrator) => orchestrator.run_analysis(request.clone(), sink).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(outcome) => outcome.into(),
        Err(e) => RunOutcome::failed(&request, e.to_string(), started_at).into(),
    }
}

/// The most recent successful analysis, if any
pub async fn get_last_analysis(state: &AppState) -> CommandResponse<Option<LastAnalysisRecord>> {
    match state.credentials().await {
        Ok(store) => CommandResponse::ok(store.get_last_analysis()),
        Err(e) => CommandResponse::err(e.to_string()),
    }
}

/// State of the current or most recent run
pub async fn get_run_state(state: &AppState) -> CommandResponse<RunState> {
    match state.orchestrator().await {
        Ok(orchestrator) => CommandResponse::ok(orchestrator.current_state().await),
        Err(e) => CommandResponse::err(e.to_string()),
    }
}
