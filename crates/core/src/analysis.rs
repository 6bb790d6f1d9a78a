//! Analysis Contract
//!
//! Request, outcome and persisted-record types for a single leaderboard run.
//! Wire names follow the frontend contract: target kinds are lowercase,
//! output formats are the tool's own uppercase names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What the target URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// A single repository: `https://<host>/<owner>/<repo>`
    Repository,
    /// Every repository of an organization: `https://<host>/<org>`
    Organization,
}

impl TargetKind {
    /// Name used in the job config file and in messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Repository => "repository",
            Self::Organization => "organization",
        }
    }

    /// Number of URL path segments a target of this kind must have
    pub fn path_segments(&self) -> usize {
        match self {
            Self::Repository => 2,
            Self::Organization => 1,
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report format understood by the tool's `--output_format` flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputFormat {
    #[default]
    Tree,
    Table,
    Markdown,
    Plain,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tree => "TREE",
            Self::Table => "TABLE",
            Self::Markdown => "MARKDOWN",
            Self::Plain => "PLAIN",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean switches forwarded to the tool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisFlags {
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub emoji: bool,
    #[serde(default)]
    pub unsorted: bool,
}

impl AnalysisFlags {
    /// Tool arguments for the active flags, in a fixed order
    pub fn to_args(&self) -> Vec<&'static str> {
        let mut args = Vec::new();
        if self.verbose {
            args.push("--verbose");
        }
        if self.emoji {
            args.push("--emoji");
        }
        if self.unsorted {
            args.push("--unsorted");
        }
        args
    }
}

/// A request to analyze one repository or organization.
///
/// Accepts the frontend's camelCase field names as aliases, with the flags
/// flattened to the top level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(alias = "repositoryUrl", alias = "targetUrl")]
    pub target_url: String,
    #[serde(alias = "targetType")]
    pub target_type: TargetKind,
    #[serde(default, alias = "outputFormat")]
    pub output_format: OutputFormat,
    #[serde(flatten)]
    pub flags: AnalysisFlags,
}

impl AnalysisRequest {
    pub fn new(target_url: impl Into<String>, target_type: TargetKind) -> Self {
        Self {
            target_url: target_url.into(),
            target_type,
            output_format: OutputFormat::default(),
            flags: AnalysisFlags::default(),
        }
    }

    /// Request for a single repository
    pub fn repository(target_url: impl Into<String>) -> Self {
        Self::new(target_url, TargetKind::Repository)
    }

    /// Request for a whole organization
    pub fn organization(target_url: impl Into<String>) -> Self {
        Self::new(target_url, TargetKind::Organization)
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_flags(mut self, flags: AnalysisFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Per-run state machine of the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Validating,
    Building,
    Running,
    Finalizing,
    Completed,
    Failed,
}

impl RunState {
    /// Whether a run in this state has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Terminal result of one run. Exactly one is produced per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub success: bool,
    /// Standard output of the tool, byte-for-byte as streamed
    pub output: String,
    pub error_message: Option<String>,
    /// Error-stream text of the tool, for display only
    pub diagnostics: Option<String>,
    /// Run start timestamp (RFC 3339)
    pub started_at: String,
    /// Run end timestamp (RFC 3339)
    pub finished_at: String,
    pub target_url: String,
    pub target_type: TargetKind,
    pub output_format: OutputFormat,
}

impl RunOutcome {
    /// Outcome of a run whose process exited successfully
    pub fn completed(
        request: &AnalysisRequest,
        output: String,
        diagnostics: Option<String>,
        started_at: String,
    ) -> Self {
        Self {
            success: true,
            output,
            error_message: None,
            diagnostics,
            started_at,
            finished_at: chrono::Utc::now().to_rfc3339(),
            target_url: request.target_url.clone(),
            target_type: request.target_type,
            output_format: request.output_format,
        }
    }

    /// Outcome of a run that failed at any stage
    pub fn failed(
        request: &AnalysisRequest,
        error_message: impl Into<String>,
        started_at: String,
    ) -> Self {
        Self {
            success: false,
            output: String::new(),
            error_message: Some(error_message.into()),
            diagnostics: None,
            started_at,
            finished_at: chrono::Utc::now().to_rfc3339(),
            target_url: request.target_url.clone(),
            target_type: request.target_type,
            output_format: request.output_format,
        }
    }

    /// Attach whatever the process printed before failing
    pub fn with_partial_output(mut self, output: String, diagnostics: Option<String>) -> Self {
        self.output = output;
        self.diagnostics = diagnostics;
        self
    }
}

/// The most recent successful run, persisted across restarts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastAnalysisRecord {
    pub target_url: String,
    pub target_type: TargetKind,
    pub output_format: OutputFormat,
    pub output: String,
    pub started_at: String,
    /// When the run finished (RFC 3339)
    pub timestamp: String,
}

impl LastAnalysisRecord {
    /// Build a record from a successful outcome; failed outcomes yield `None`
    pub fn from_outcome(outcome: &RunOutcome) -> Option<Self> {
        if !outcome.success {
            return None;
        }
        Some(Self {
            target_url: outcome.target_url.clone(),
            target_type: outcome.target_type,
            output_format: outcome.output_format,
            output: outcome.output.clone(),
            started_at: outcome.started_at.clone(),
            timestamp: outcome.finished_at.clone(),
        })
    }
}
