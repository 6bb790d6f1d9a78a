//! Analysis Error Types
//!
//! The error taxonomy of the analysis subsystem. These errors are
//! dependency-free (only thiserror + std) so both the backend and any UI
//! binding can match on them.
//!
//! The application crate wraps these in its own error type together with the
//! storage variants (Database, Sqlite, Secret) that need heavier dependencies.

use thiserror::Error;

use crate::analysis::TargetKind;

/// Errors produced while validating, launching or probing an analysis run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// No GitHub token has been stored
    #[error("GitHub token not configured. Please set it in Settings.")]
    MissingCredential,

    /// The target URL does not have the shape required by its kind
    #[error("Invalid {kind} URL '{url}': {reason}")]
    InvalidTarget {
        kind: TargetKind,
        url: String,
        reason: String,
    },

    /// Another run is active on the same orchestrator
    #[error("An analysis is already running")]
    RunAlreadyInProgress,

    /// The external process could not be started
    #[error("Failed to start analysis process: {0}")]
    ProcessSpawnFailure(String),

    /// The external process exited unsuccessfully, timed out or was cancelled
    #[error("Analysis process failed: {0}")]
    ProcessExitFailure(String),

    /// The interpreter could not be launched at all
    #[error("Python not found ({0}). Please install Python 3.8 or higher.")]
    RuntimeNotFound(String),

    /// The interpreter ran but did not print a dotted version number
    #[error("Could not parse Python version from output: {0:?}")]
    UnparsableVersion(String),

    /// A scratch config file could not be removed. Logged, never returned.
    #[error("Failed to remove scratch file {path}: {reason}")]
    ScratchCleanupFailure { path: String, reason: String },
}

/// Result type alias for analysis errors
pub type AnalysisResult<T> = Result<T, AnalysisError>;

impl AnalysisError {
    /// Create an invalid target error
    pub fn invalid_target(
        kind: TargetKind,
        url: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidTarget {
            kind,
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Convert AnalysisError to a string
impl From<AnalysisError> for String {
    fn from(err: AnalysisError) -> String {
        err.to_string()
    }
}
