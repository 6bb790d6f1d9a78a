//! Analysis Orchestrator
//!
//! Coordinates one leaderboard run at a time:
//!
//! ```text
//! Idle → Validating → Building → Running → Finalizing → {Completed, Failed}
//! ```
//!
//! Precondition failures (missing token, malformed target, busy orchestrator)
//! are returned as errors before anything is spawned. Once the process has
//! been started every failure is reported as an unsuccessful [`RunOutcome`].

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard, RwLock};
use uuid::Uuid;

use slim_leaderboard_core::{
    AnalysisError, AnalysisRequest, LastAnalysisRecord, ProgressEvent, ProgressSink, RunOutcome,
    RunState,
};

use super::job_config::{validate_target, JobConfig, JobConfigBuilder};
use super::process_runner::{ProcessRunner, ProcessSpec};
use super::progress::{
    forward_chunks, STATUS_ANALYZING, STATUS_COMPLETE, STATUS_FAILED, STATUS_STARTING,
};
use crate::models::settings::AppConfig;
use crate::storage::credential_store::CredentialStore;
use crate::utils::error::AppResult;

/// Environment variable carrying the GitHub token to the tool
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";
/// Environment variable carrying the tool's source directory
pub const SEARCH_PATH_ENV: &str = "PYTHONPATH";

/// How the leaderboard tool is launched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    /// Arguments placed before the job arguments
    pub leading_args: Vec<String>,
    /// Exported as PYTHONPATH when set
    pub search_path: Option<String>,
    pub timeout: Option<Duration>,
}

impl ToolCommand {
    /// `<python> -u -m <module>` with unbuffered output
    pub fn python_module(python: impl Into<String>, module: &str) -> Self {
        Self {
            program: python.into(),
            leading_args: vec!["-u".to_string(), "-m".to_string(), module.to_string()],
            search_path: None,
            timeout: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            search_path: config.tool_path.clone(),
            timeout: config.run_timeout(),
            ..Self::python_module(config.python(), &config.tool_module)
        }
    }

    fn spec(&self, job: &JobConfig, token: &str) -> ProcessSpec {
        let mut spec = ProcessSpec::new(&self.program)
            .args(self.leading_args.iter().cloned())
            .args(job.args().iter().cloned())
            .env(TOKEN_ENV, token)
            .with_timeout(self.timeout);
        if let Some(ref path) = self.search_path {
            spec = spec.env(SEARCH_PATH_ENV, path);
        }
        spec
    }
}

#[derive(Debug, Clone)]
struct RunSettings {
    tool: ToolCommand,
    builder: JobConfigBuilder,
}

/// Holds the run slot for one run. A run dropped before it finished, such as
/// a cancelled IPC call, is marked failed when this goes away.
struct ActiveRun<'a> {
    _slot: MutexGuard<'a, ()>,
    state: &'a RwLock<RunState>,
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_write() {
            if !state.is_terminal() {
                tracing::warn!("Analysis run abandoned in state {:?}", *state);
                *state = RunState::Failed;
            }
        }
    }
}

/// Runs the leaderboard tool and records successful results
pub struct AnalysisOrchestrator {
    store: CredentialStore,
    runner: ProcessRunner,
    settings: RwLock<RunSettings>,
    run_slot: Mutex<()>,
    state: RwLock<RunState>,
}

impl AnalysisOrchestrator {
    pub fn new(store: CredentialStore, tool: ToolCommand, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            runner: ProcessRunner::new(),
            settings: RwLock::new(RunSettings {
                tool,
                builder: JobConfigBuilder::new(scratch_dir),
            }),
            run_slot: Mutex::new(()),
            state: RwLock::new(RunState::Idle),
        }
    }

    pub fn from_config(store: CredentialStore, config: &AppConfig) -> Self {
        Self::new(store, ToolCommand::from_config(config), config.scratch_dir())
    }

    /// Apply new settings. A run already in flight keeps the ones it started with.
    pub async fn reconfigure(&self, config: &AppConfig) {
        let mut settings = self.settings.write().await;
        settings.tool = ToolCommand::from_config(config);
        settings.builder = JobConfigBuilder::new(config.scratch_dir());
    }

    /// State of the current or most recent run
    pub async fn current_state(&self) -> RunState {
        *self.state.read().await
    }

    /// Whether a run currently holds the orchestrator
    pub fn is_running(&self) -> bool {
        self.run_slot.try_lock().is_err()
    }

    async fn set_state(&self, state: RunState) {
        *self.state.write().await = state;
    }

    /// Run one analysis to completion.
    ///
    /// Progress goes to `sink` while the call is pending. Returns `Err` only
    /// for failures detected before the process is spawned; every later
    /// failure is an `Ok` outcome with `success == false`.
    pub async fn run_analysis(
        &self,
        request: AnalysisRequest,
        sink: &dyn ProgressSink,
    ) -> AppResult<RunOutcome> {
        let _run = ActiveRun {
            _slot: self
                .run_slot
                .try_lock()
                .map_err(|_| AnalysisError::RunAlreadyInProgress)?,
            state: &self.state,
        };

        let run_id = Uuid::new_v4().to_string()[..8].to_string();
        tracing::info!(
            "[run {}] Analysis requested for {} ({})",
            run_id,
            request.target_url,
            request.target_type
        );

        let result = self.execute(&run_id, &request, sink).await;
        match result {
            Ok(ref outcome) if outcome.success => {
                self.set_state(RunState::Completed).await;
                sink.emit(ProgressEvent::status(STATUS_COMPLETE));
                tracing::info!("[run {}] Completed", run_id);
            }
            Ok(ref outcome) => {
                self.set_state(RunState::Failed).await;
                sink.emit(ProgressEvent::status(STATUS_FAILED));
                tracing::warn!(
                    "[run {}] Failed: {}",
                    run_id,
                    outcome.error_message.as_deref().unwrap_or("unknown error")
                );
            }
            Err(ref e) => {
                self.set_state(RunState::Failed).await;
                tracing::warn!("[run {}] Rejected before launch: {}", run_id, e);
            }
        }
        result
    }

    async fn execute(
        &self,
        run_id: &str,
        request: &AnalysisRequest,
        sink: &dyn ProgressSink,
    ) -> AppResult<RunOutcome> {
        let started_at = chrono::Utc::now().to_rfc3339();
        self.set_state(RunState::Idle).await;

        let token = self
            .store
            .get_token()?
            .ok_or(AnalysisError::MissingCredential)?;

        self.set_state(RunState::Validating).await;
        validate_target(&request.target_url, request.target_type)?;

        self.set_state(RunState::Building).await;
        let settings = self.settings.read().await.clone();
        let job = settings.builder.build(request)?;

        self.set_state(RunState::Running).await;
        sink.emit(ProgressEvent::status(STATUS_STARTING));

        let mut handle = self.runner.start(&settings.tool.spec(&job, &token));
        drop(token);
        tracing::info!(
            "[run {}] Started {} (pid {:?})",
            run_id,
            settings.tool.program,
            handle.pid()
        );

        let process = match handle.take_output() {
            Some(chunks) => {
                let (outcome, forwarded) =
                    tokio::join!(handle.wait(), forward_chunks(chunks, sink, STATUS_ANALYZING));
                tracing::debug!("[run {}] Forwarded {} output chunks", run_id, forwarded);
                outcome
            }
            None => handle.wait().await,
        };

        self.set_state(RunState::Finalizing).await;
        if let Err(e) = job.remove() {
            tracing::warn!("[run {}] {}", run_id, e);
        }

        let diagnostics = process.diagnostics();
        if process.exit_ok {
            let outcome = RunOutcome::completed(request, process.output, diagnostics, started_at);
            if let Some(record) = LastAnalysisRecord::from_outcome(&outcome) {
                self.store.save_last_analysis(&record);
            }
            return Ok(outcome);
        }

        let message = process
            .failure
            .as_ref()
            .map(|failure| failure.to_analysis_error().to_string())
            .unwrap_or_else(|| AnalysisError::ProcessExitFailure("unknown".into()).to_string());
        if let Some(ref text) = diagnostics {
            tracing::debug!("[run {}] Tool diagnostics: {}", run_id, text);
        }
        Ok(RunOutcome::failed(request, message, started_at)
            .with_partial_output(process.output, diagnostics))
    }
}

impl std::fmt::Debug for AnalysisOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisOrchestrator")
            .field("running", &self.is_running())
            .finish()
    }
}
