//! External Process Runner
//!
//! Runs one external process to completion and exposes two observation
//! points over the same execution:
//!
//! - the **incremental** channel ([`ProcessHandle::take_output`]): stdout
//!   chunks, one per line with its terminator, in the order produced;
//! - the **aggregate** channel ([`ProcessHandle::wait`]): resolves exactly
//!   once with the exit classification, the full stdout and the stderr text.
//!
//! The aggregate output is the concatenation of every incremental chunk and
//! resolves only after stdout reached end-of-stream. The aggregate always
//! resolves: spawn failures, pipe errors, cancellation and timeouts all
//! produce a failed outcome instead of a pending one.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use slim_leaderboard_core::AnalysisError;

/// How long output readers may keep draining after the process is gone.
/// A grandchild holding the pipe open must not stall the aggregate result.
const READER_GRACE: Duration = Duration::from_secs(5);

/// What to launch
#[derive(Debug, Clone, Default)]
pub struct ProcessSpec {
    /// Executable name or path
    pub program: String,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Variables added to the child's environment only
    pub env: HashMap<String, String>,
    /// Kill the process after this long
    pub timeout: Option<Duration>,
}

impl ProcessSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set a variable in the child's environment
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Why a process did not finish successfully
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessFailure {
    #[error("{0}")]
    Spawn(String),
    #[error("process exited with status {0}")]
    ExitStatus(i32),
    #[error("process was terminated by a signal")]
    Signaled,
    #[error("process was cancelled")]
    Cancelled,
    #[error("process timed out after {0} seconds")]
    TimedOut(u64),
    #[error("I/O error on process pipes: {0}")]
    Io(String),
}

impl ProcessFailure {
    /// Map to the analysis error taxonomy
    pub fn to_analysis_error(&self) -> AnalysisError {
        match self {
            Self::Spawn(msg) => AnalysisError::ProcessSpawnFailure(msg.clone()),
            other => AnalysisError::ProcessExitFailure(other.to_string()),
        }
    }
}

/// Aggregate result of one process execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// True only for a success exit status with intact pipes
    pub exit_ok: bool,
    pub exit_code: Option<i32>,
    /// Everything written to stdout
    pub output: String,
    /// Everything written to stderr; informational only
    pub diagnostics: String,
    pub failure: Option<ProcessFailure>,
}

impl ProcessOutcome {
    fn failed(failure: ProcessFailure) -> Self {
        Self {
            exit_ok: false,
            exit_code: None,
            output: String::new(),
            diagnostics: String::new(),
            failure: Some(failure),
        }
    }

    /// Diagnostics text, or `None` when stderr was silent
    pub fn diagnostics(&self) -> Option<String> {
        let trimmed = self.diagnostics.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Handle over one running process.
///
/// Dropping the handle cancels the process.
pub struct ProcessHandle {
    pid: Option<u32>,
    output_rx: Option<mpsc::UnboundedReceiver<String>>,
    outcome_rx: oneshot::Receiver<ProcessOutcome>,
    cancel: CancellationToken,
}

impl ProcessHandle {
    /// OS process id; `None` when the spawn failed
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Take the incremental output channel (can only be called once)
    pub fn take_output(&mut self) -> Option<mpsc::UnboundedReceiver<String>> {
        self.output_rx.take()
    }

    /// Request termination. The aggregate still resolves, with `exit_ok = false`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the aggregate result
    pub async fn wait(mut self) -> ProcessOutcome {
        match (&mut self.outcome_rx).await {
            Ok(outcome) => outcome,
            Err(_) => ProcessOutcome::failed(ProcessFailure::Io(
                "process supervisor stopped before reporting".to_string(),
            )),
        }
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        // No-op once the supervisor has reported
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Launches processes and supervises them on the tokio runtime
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Spawn the process and return immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, spec: &ProcessSpec) -> ProcessHandle {
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let cancel = CancellationToken::new();

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let message = if e.kind() == std::io::ErrorKind::NotFound {
                    format!("'{}' not found", spec.program)
                } else {
                    format!("failed to spawn '{}': {}", spec.program, e)
                };
                tracing::warn!("Process spawn failed: {}", message);
                let _ = outcome_tx.send(ProcessOutcome::failed(ProcessFailure::Spawn(message)));
                return ProcessHandle {
                    pid: None,
                    output_rx: Some(output_rx),
                    outcome_rx,
                    cancel,
                };
            }
        };

        let pid = child.id();
        tracing::debug!("Spawned '{}' (pid {:?})", spec.program, pid);

        let stdout_buf = SharedText::default();
        let stderr_buf = SharedText::default();
        let stdout_task = child
            .stdout
            .take()
            .map(|out| tokio::spawn(pump_lines(out, stdout_buf.clone(), output_tx)));
        let stderr_task = child
            .stderr
            .take()
            .map(|err| tokio::spawn(pump_all(err, stderr_buf.clone())));

        let supervisor = Supervisor {
            child,
            timeout: spec.timeout,
            cancel: cancel.clone(),
            stdout_task,
            stderr_task,
            stdout_buf,
            stderr_buf,
        };
        tokio::spawn(async move {
            let outcome = supervisor.run().await;
            let _ = outcome_tx.send(outcome);
        });

        ProcessHandle {
            pid,
            output_rx: Some(output_rx),
            outcome_rx,
            cancel,
        }
    }

    /// Start a process and wait for its aggregate result, ignoring the
    /// incremental channel
    pub async fn run(&self, spec: &ProcessSpec) -> ProcessOutcome {
        self.start(spec).wait().await
    }
}

/// Text buffer shared between a reader task and the supervisor, so output
/// read before a forced abort is not lost
#[derive(Debug, Clone, Default)]
struct SharedText(Arc<Mutex<String>>);

impl SharedText {
    fn push(&self, text: &str) {
        self.0
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_str(text);
    }

    fn take(&self) -> String {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }
}

/// Read line by line, forwarding each line (terminator included) as a chunk
async fn pump_lines<R>(
    reader: R,
    buffer: SharedText,
    chunks: mpsc::UnboundedSender<String>,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            return Ok(());
        }
        let chunk = String::from_utf8_lossy(&line).into_owned();
        buffer.push(&chunk);
        // A departed observer only loses events; the aggregate is unaffected
        let _ = chunks.send(chunk);
    }
}

/// Read the whole stream into the buffer
async fn pump_all<R>(mut reader: R, buffer: SharedText) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    let result = reader.read_to_end(&mut bytes).await;
    buffer.push(&String::from_utf8_lossy(&bytes));
    result.map(|_| ())
}

enum Termination {
    Exited(std::io::Result<std::process::ExitStatus>),
    Cancelled,
    TimedOut(Duration),
}

struct Supervisor {
    child: Child,
    timeout: Option<Duration>,
    cancel: CancellationToken,
    stdout_task: Option<JoinHandle<std::io::Result<()>>>,
    stderr_task: Option<JoinHandle<std::io::Result<()>>>,
    stdout_buf: SharedText,
    stderr_buf: SharedText,
}

impl Supervisor {
    async fn run(mut self) -> ProcessOutcome {
        let timeout = self.timeout;
        let deadline = async move {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        let termination = tokio::select! {
            status = self.child.wait() => Termination::Exited(status),
            _ = self.cancel.cancelled() => Termination::Cancelled,
            _ = deadline => Termination::TimedOut(timeout.unwrap_or_default()),
        };

        if !matches!(termination, Termination::Exited(_)) {
            if let Err(e) = self.child.kill().await {
                tracing::warn!("Failed to kill process: {}", e);
            }
        }

        let stdout_result = join_reader(self.stdout_task.take()).await;
        let stderr_result = join_reader(self.stderr_task.take()).await;

        let (exit_code, failure) = match termination {
            Termination::Cancelled => (None, Some(ProcessFailure::Cancelled)),
            Termination::TimedOut(limit) => (None, Some(ProcessFailure::TimedOut(limit.as_secs()))),
            Termination::Exited(Err(e)) => (
                None,
                Some(ProcessFailure::Io(format!("failed to wait for process: {}", e))),
            ),
            Termination::Exited(Ok(status)) => {
                let failure = if !status.success() {
                    Some(match status.code() {
                        Some(code) => ProcessFailure::ExitStatus(code),
                        None => ProcessFailure::Signaled,
                    })
                } else if let Err(e) = stdout_result {
                    Some(ProcessFailure::Io(e))
                } else {
                    if let Err(e) = stderr_result {
                        tracing::debug!("stderr reader failed after successful exit: {}", e);
                    }
                    None
                };
                (status.code(), failure)
            }
        };

        let outcome = ProcessOutcome {
            exit_ok: failure.is_none(),
            exit_code,
            output: self.stdout_buf.take(),
            diagnostics: self.stderr_buf.take(),
            failure,
        };

        tracing::debug!(
            "Process finished: exit_ok={} code={:?} stdout={}B stderr={}B",
            outcome.exit_ok,
            outcome.exit_code,
            outcome.output.len(),
            outcome.diagnostics.len()
        );
        outcome
    }
}

/// Wait for a reader task, aborting it if the pipe stays open too long
async fn join_reader(task: Option<JoinHandle<std::io::Result<()>>>) -> Result<(), String> {
    let Some(mut task) = task else {
        return Ok(());
    };
    match tokio::time::timeout(READER_GRACE, &mut task).await {
        Ok(Ok(Ok(()))) => Ok(()),
        Ok(Ok(Err(e))) => Err(e.to_string()),
        Ok(Err(join_err)) => Err(format!("reader task failed: {}", join_err)),
        Err(_) => {
            task.abort();
            Err("output stream stayed open after the process exited".to_string())
        }
    }
}
