//! Environment Probe
//!
//! Checks the Python interpreter the tool needs and installs the tool's own
//! requirements. Independent of any analysis run.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use slim_leaderboard_core::{AnalysisError, ProgressEvent, ProgressSink};

use super::process_runner::{ProcessFailure, ProcessRunner, ProcessSpec};
use super::progress::{forward_chunks, STATUS_INSTALLED, STATUS_INSTALLING};
use crate::models::settings::AppConfig;
use crate::utils::error::{AppError, AppResult};

/// Prints `major.minor.micro` of the running interpreter
pub const VERSION_SCRIPT: &str = "import sys; print('.'.join(str(v) for v in sys.version_info[:3]))";

/// Upper bound for the version check
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

fn version_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\d+(\.\d+)+$").ok())
        .as_ref()
}

/// Result of a successful runtime check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeInfo {
    pub version: String,
    /// Interpreter that was probed
    pub path: String,
}

/// Extract a dotted version from the interpreter's output
pub fn parse_version(output: &str) -> Result<String, AnalysisError> {
    let candidate = output.trim();
    let matches = version_pattern().is_some_and(|re| re.is_match(candidate));
    if matches {
        Ok(candidate.to_string())
    } else {
        Err(AnalysisError::UnparsableVersion(candidate.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct EnvironmentProbe {
    program: String,
    probe_args: Vec<String>,
    timeout: Duration,
    requirements: Option<PathBuf>,
    runner: ProcessRunner,
}

impl EnvironmentProbe {
    /// Probe `program` with the version script
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            probe_args: vec!["-c".to_string(), VERSION_SCRIPT.to_string()],
            timeout: PROBE_TIMEOUT,
            requirements: None,
            runner: ProcessRunner::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut probe = Self::new(config.python());
        probe.requirements = config.requirements_path();
        probe
    }

    /// Replace the arguments used for the version check
    pub fn with_probe_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.probe_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_requirements(mut self, path: impl Into<PathBuf>) -> Self {
        self.requirements = Some(path.into());
        self
    }

    /// Run the interpreter once and report its version
    pub async fn check_runtime(&self) -> AppResult<RuntimeInfo> {
        let spec = ProcessSpec::new(&self.program)
            .args(self.probe_args.iter().cloned())
            .with_timeout(Some(self.timeout));
        let outcome = self.runner.run(&spec).await;

        match &outcome.failure {
            None => {}
            Some(ProcessFailure::Spawn(reason)) => {
                return Err(AnalysisError::RuntimeNotFound(reason.clone()).into());
            }
            // The interpreter launched but did not finish cleanly
            Some(failure) => {
                let detail = outcome
                    .diagnostics()
                    .map(|d| format!("{}: {}", failure, d))
                    .unwrap_or_else(|| failure.to_string());
                return Err(AnalysisError::ProcessExitFailure(detail).into());
            }
        }

        let version = parse_version(&outcome.output)?;
        tracing::info!("Found Python {} at {}", version, self.program);
        Ok(RuntimeInfo {
            version,
            path: self.program.clone(),
        })
    }

    /// `pip install -r requirements.txt` for the tool
    pub async fn install_dependencies(&self, sink: &dyn ProgressSink) -> AppResult<()> {
        let requirements = self.requirements.as_ref().ok_or_else(|| {
            AppError::config("Tool path is not configured; cannot locate requirements.txt")
        })?;
        if !requirements.is_file() {
            return Err(AppError::config(format!(
                "Requirements file not found: {}",
                requirements.display()
            )));
        }

        sink.emit(ProgressEvent::status(STATUS_INSTALLING));
        tracing::info!("Installing dependencies from {}", requirements.display());

        let spec = ProcessSpec::new(&self.program).args([
            "-m".to_string(),
            "pip".to_string(),
            "install".to_string(),
            "-r".to_string(),
            requirements.display().to_string(),
        ]);
        let mut handle = self.runner.start(&spec);
        let outcome = match handle.take_output() {
            Some(chunks) => {
                tokio::join!(handle.wait(), forward_chunks(chunks, sink, STATUS_INSTALLING)).0
            }
            None => handle.wait().await,
        };

        if let Some(ref failure) = outcome.failure {
            if let Some(text) = outcome.diagnostics() {
                tracing::warn!("pip diagnostics: {}", text);
            }
            return Err(failure.to_analysis_error().into());
        }

        sink.emit(ProgressEvent::status(STATUS_INSTALLED));
        Ok(())
    }
}
