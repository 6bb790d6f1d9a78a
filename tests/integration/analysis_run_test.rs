//! Analysis Run Integration Tests
//!
//! Drive the orchestrator end to end with small `/bin/sh` scripts standing
//! in for the leaderboard tool. The scripts receive the same arguments the
//! real tool would: `--output_format <FMT> [flags] <config path>`.
#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use slim_leaderboard_core::{
    AnalysisError, AnalysisFlags, AnalysisRequest, NoopSink, OutputFormat, ProgressEvent,
    RunState,
};
use slim_leaderboard_desktop::services::analysis::{
    AnalysisOrchestrator, ChannelProgressSink, JobFile, ToolCommand,
};
use slim_leaderboard_desktop::storage::{CredentialStore, Database, SecretCipher};
use slim_leaderboard_desktop::AppError;
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

struct Fixture {
    dir: TempDir,
    store: CredentialStore,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("data.db")).unwrap();
        let cipher = SecretCipher::load_or_create(&dir.path().join("secret.key")).unwrap();
        Self {
            dir,
            store: CredentialStore::new(db, cipher),
        }
    }

    fn with_token() -> Self {
        let fixture = Self::new();
        fixture.store.set_token("ghp_integration").unwrap();
        fixture
    }

    fn scratch(&self) -> PathBuf {
        self.dir.path().join("scratch")
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `body` as a script and return a tool command that runs it
    fn tool(&self, name: &str, body: &str) -> ToolCommand {
        let script = self.path(name);
        std::fs::write(&script, format!("#!/bin/sh\n{}\n", body)).unwrap();
        ToolCommand {
            program: "sh".to_string(),
            leading_args: vec![script.display().to_string()],
            search_path: Some("/opt/slim-leaderboard/src".to_string()),
            timeout: None,
        }
    }

    fn orchestrator(&self, tool: ToolCommand) -> AnalysisOrchestrator {
        AnalysisOrchestrator::new(self.store.clone(), tool, self.scratch())
    }
}

fn widget_request() -> AnalysisRequest {
    AnalysisRequest::repository("https://github.com/acme/widget").with_format(OutputFormat::Markdown)
}

fn scratch_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

async fn drain(mut rx: tokio::sync::mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

// ============================================================================
// Successful Runs
// ============================================================================

#[tokio::test]
async fn test_successful_run_records_last_analysis() {
    let fixture = Fixture::with_token();
    let orchestrator = fixture.orchestrator(fixture.tool("tool.sh", "printf '# Report\\nAll checks passed'"));
    let (sink, rx) = ChannelProgressSink::new();

    let outcome = orchestrator
        .run_analysis(widget_request(), &sink)
        .await
        .unwrap();
    drop(sink);

    assert!(outcome.success);
    assert_eq!(outcome.output, "# Report\nAll checks passed");
    assert!(outcome.error_message.is_none());
    assert_eq!(orchestrator.current_state().await, RunState::Completed);

    let record = fixture.store.get_last_analysis().unwrap();
    assert_eq!(record.target_url, "https://github.com/acme/widget");
    assert_eq!(record.output_format, OutputFormat::Markdown);
    assert_eq!(record.output, outcome.output);

    let events = drain(rx).await;
    assert_eq!(events.first().unwrap().message, "Starting analysis...");
    assert_eq!(events.last().unwrap().message, "Analysis complete");
}

#[tokio::test]
async fn test_chunks_reconstruct_output() {
    let fixture = Fixture::with_token();
    let body = "i=0\nwhile [ $i -lt 200 ]; do echo \"repo-$i score=$i\"; i=$((i+1)); done\nprintf 'tail without newline'";
    let orchestrator = fixture.orchestrator(fixture.tool("tool.sh", body));
    let (sink, rx) = ChannelProgressSink::new();

    let outcome = orchestrator
        .run_analysis(widget_request(), &sink)
        .await
        .unwrap();
    drop(sink);

    let chunks: Vec<String> = drain(rx)
        .await
        .into_iter()
        .filter(|event| event.message == "Analyzing...")
        .map(|event| event.raw_chunk.unwrap())
        .collect();

    assert!(outcome.success);
    assert_eq!(chunks.len(), 201);
    assert_eq!(chunks.first().map(String::as_str), Some("repo-0 score=0\n"));
    assert_eq!(chunks.concat(), outcome.output);
}

#[tokio::test]
async fn test_stderr_with_success_exit_is_diagnostic_only() {
    let fixture = Fixture::with_token();
    let orchestrator = fixture.orchestrator(fixture.tool(
        "tool.sh",
        "echo 'WARNING: rate limit low' >&2\necho '| repo | score |'",
    ));

    let outcome = orchestrator
        .run_analysis(widget_request(), &NoopSink)
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.output, "| repo | score |\n");
    assert_eq!(outcome.diagnostics.as_deref(), Some("WARNING: rate limit low"));
    assert!(fixture.store.get_last_analysis().is_some());
}

#[tokio::test]
async fn test_arguments_and_config_file() {
    let fixture = Fixture::with_token();
    // Echo the arguments, then the config file named by the last one
    let body = "echo \"$@\"\nfor last; do :; done\ncat \"$last\"";
    let orchestrator = fixture.orchestrator(fixture.tool("tool.sh", body));
    let request = AnalysisRequest::organization("https://github.com/acme/")
        .with_format(OutputFormat::Plain)
        .with_flags(AnalysisFlags {
            verbose: true,
            emoji: true,
            unsorted: true,
        });

    let outcome = orchestrator.run_analysis(request, &NoopSink).await.unwrap();
    assert!(outcome.success);

    let (args_line, config_json) = outcome.output.split_once('\n').unwrap();
    let args: Vec<&str> = args_line.split(' ').collect();
    assert_eq!(
        &args[..5],
        &["--output_format", "PLAIN", "--verbose", "--emoji", "--unsorted"]
    );
    assert_eq!(args.len(), 6);
    assert!(args[5].contains("slim-config-"));

    let job: JobFile = serde_json::from_str(config_json).unwrap();
    assert_eq!(job.targets.len(), 1);
    assert_eq!(job.targets[0].name, "https://github.com/acme/");
}

#[tokio::test]
async fn test_environment_is_scoped_to_child() {
    let fixture = Fixture::with_token();
    let before = std::env::var("PYTHONPATH").ok();
    let orchestrator = fixture.orchestrator(fixture.tool(
        "tool.sh",
        "printf '%s|%s' \"$GITHUB_TOKEN\" \"$PYTHONPATH\"",
    ));

    let outcome = orchestrator
        .run_analysis(widget_request(), &NoopSink)
        .await
        .unwrap();

    assert_eq!(outcome.output, "ghp_integration|/opt/slim-leaderboard/src");
    assert_eq!(std::env::var("PYTHONPATH").ok(), before);
}

#[tokio::test]
async fn test_scratch_file_removed_after_run() {
    let fixture = Fixture::with_token();
    let seen = fixture.path("seen-config");
    let body = format!("for last; do :; done\necho \"$last\" > '{}'", seen.display());
    let orchestrator = fixture.orchestrator(fixture.tool("tool.sh", &body));

    orchestrator
        .run_analysis(widget_request(), &NoopSink)
        .await
        .unwrap();

    let config_path = std::fs::read_to_string(&seen).unwrap();
    assert!(!Path::new(config_path.trim()).exists());
    assert_eq!(scratch_files(&fixture.scratch()), 0);
}

// ============================================================================
// Failed Runs
// ============================================================================

#[tokio::test]
async fn test_nonzero_exit_leaves_record_unchanged() {
    let fixture = Fixture::with_token();
    let good = fixture.orchestrator(fixture.tool("good.sh", "printf 'first report'"));
    good.run_analysis(widget_request(), &NoopSink).await.unwrap();
    let previous = fixture.store.get_last_analysis().unwrap();

    let bad = fixture.orchestrator(fixture.tool(
        "bad.sh",
        "echo 'partial'\necho 'Traceback: boom' >&2\nexit 2",
    ));
    let (sink, rx) = ChannelProgressSink::new();
    let outcome = bad.run_analysis(widget_request(), &sink).await.unwrap();
    drop(sink);

    assert!(!outcome.success);
    assert_eq!(
        outcome.error_message.as_deref(),
        Some("Analysis process failed: process exited with status 2")
    );
    assert_eq!(outcome.output, "partial\n");
    assert_eq!(outcome.diagnostics.as_deref(), Some("Traceback: boom"));
    assert_eq!(bad.current_state().await, RunState::Failed);
    assert_eq!(fixture.store.get_last_analysis().unwrap(), previous);
    assert_eq!(scratch_files(&fixture.scratch()), 0);

    let events = drain(rx).await;
    assert_eq!(events.last().unwrap().message, "Analysis failed");
}

#[tokio::test]
async fn test_missing_token_spawns_nothing() {
    let fixture = Fixture::new();
    let marker = fixture.path("spawned");
    let orchestrator =
        fixture.orchestrator(fixture.tool("tool.sh", &format!("touch '{}'", marker.display())));

    let result = orchestrator.run_analysis(widget_request(), &NoopSink).await;

    assert!(matches!(
        result,
        Err(AppError::Analysis(AnalysisError::MissingCredential))
    ));
    assert!(!marker.exists());
    assert!(!fixture.scratch().exists());
}

#[tokio::test]
async fn test_invalid_target_spawns_nothing() {
    let fixture = Fixture::with_token();
    let marker = fixture.path("spawned");
    let orchestrator =
        fixture.orchestrator(fixture.tool("tool.sh", &format!("touch '{}'", marker.display())));

    let result = orchestrator
        .run_analysis(AnalysisRequest::repository("https://github.com/acme"), &NoopSink)
        .await;

    assert!(matches!(
        result,
        Err(AppError::Analysis(AnalysisError::InvalidTarget { .. }))
    ));
    assert!(!marker.exists());
    assert_eq!(scratch_files(&fixture.scratch()), 0);
}

#[tokio::test]
async fn test_timeout_fails_run_and_resolves() {
    let fixture = Fixture::with_token();
    let mut tool = fixture.tool("slow.sh", "echo started\nexec sleep 30");
    tool.timeout = Some(Duration::from_millis(300));
    let orchestrator = fixture.orchestrator(tool);

    let outcome = tokio::time::timeout(
        Duration::from_secs(15),
        orchestrator.run_analysis(widget_request(), &NoopSink),
    )
    .await
    .expect("run must resolve after the timeout")
    .unwrap();

    assert!(!outcome.success);
    assert!(outcome.error_message.unwrap().contains("timed out"));
    assert!(fixture.store.get_last_analysis().is_none());
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn test_second_run_rejected_while_active() {
    let fixture = Fixture::with_token();
    let orchestrator = Arc::new(fixture.orchestrator(fixture.tool("tool.sh", "sleep 1\necho done")));

    let active = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.run_analysis(widget_request(), &NoopSink).await })
    };

    let mut waited = Duration::ZERO;
    while orchestrator.current_state().await != RunState::Running {
        assert!(waited < Duration::from_secs(5), "first run never started");
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += Duration::from_millis(10);
    }

    let second = orchestrator.run_analysis(widget_request(), &NoopSink).await;
    assert!(matches!(
        second,
        Err(AppError::Analysis(AnalysisError::RunAlreadyInProgress))
    ));
    assert_eq!(orchestrator.current_state().await, RunState::Running);

    let first = active.await.unwrap().unwrap();
    assert!(first.success);
    assert_eq!(first.output, "done\n");
    assert!(!orchestrator.is_running());

    // The slot is free again
    let third = orchestrator.run_analysis(widget_request(), &NoopSink).await.unwrap();
    assert!(third.success);
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_last_analysis_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("data.db");
    let key_path = dir.path().join("secret.key");
    let script = dir.path().join("tool.sh");
    std::fs::write(&script, "#!/bin/sh\nprintf 'persisted'\n").unwrap();

    {
        let store = CredentialStore::new(
            Database::open(&db_path).unwrap(),
            SecretCipher::load_or_create(&key_path).unwrap(),
        );
        store.set_token("ghp_restart").unwrap();
        let tool = ToolCommand {
            program: "sh".to_string(),
            leading_args: vec![script.display().to_string()],
            search_path: None,
            timeout: None,
        };
        let orchestrator = AnalysisOrchestrator::new(store, tool, dir.path().join("scratch"));
        assert!(orchestrator
            .run_analysis(widget_request(), &NoopSink)
            .await
            .unwrap()
            .success);
    }

    let reopened = CredentialStore::new(
        Database::open(&db_path).unwrap(),
        SecretCipher::load_or_create(&key_path).unwrap(),
    );
    assert_eq!(reopened.get_token().unwrap().as_deref(), Some("ghp_restart"));
    let record = reopened.get_last_analysis().unwrap();
    assert_eq!(record.output, "persisted");
    assert_eq!(record.target_url, "https://github.com/acme/widget");
}
