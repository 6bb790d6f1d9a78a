//! Job Config Builder
//!
//! Validates an analysis target and writes the per-run config file the
//! leaderboard tool reads. The builder only creates the file; whoever runs
//! the job removes it afterwards with [`JobConfig::remove`].

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use slim_leaderboard_core::{AnalysisError, AnalysisRequest, AnalysisResult, TargetKind};

use crate::utils::error::AppResult;
use crate::utils::paths::ensure_dir;

/// `https://<authority>/<segment>[/<segment>][/]`
fn target_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^https://([^/?#\s]+)/([A-Za-z0-9_.-]+)(?:/([A-Za-z0-9_.-]+))?/?$").ok()
        })
        .as_ref()
}

/// One entry of the config file's `targets` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDescriptor {
    #[serde(rename = "type")]
    pub kind: TargetKind,
    pub name: String,
}

/// On-disk shape of the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFile {
    pub targets: Vec<TargetDescriptor>,
}

/// Check that `url` has the shape required by `kind` and return it trimmed
pub fn validate_target(url: &str, kind: TargetKind) -> AnalysisResult<String> {
    let trimmed = url.trim();
    let invalid = |reason: &str| AnalysisError::invalid_target(kind, trimmed, reason);

    if trimmed.is_empty() {
        return Err(invalid("URL is empty"));
    }

    let pattern = target_pattern().ok_or_else(|| invalid("URL pattern unavailable"))?;
    let captures = pattern.captures(trimmed).ok_or_else(|| {
        invalid(match kind {
            TargetKind::Repository => "expected https://<host>/<owner>/<repo>",
            TargetKind::Organization => "expected https://<host>/<org>",
        })
    })?;

    let segments: Vec<&str> = captures
        .iter()
        .skip(2)
        .flatten()
        .map(|m| m.as_str())
        .collect();
    if segments.len() != kind.path_segments() {
        return Err(invalid(&format!(
            "expected {} path segment(s), found {}",
            kind.path_segments(),
            segments.len()
        )));
    }
    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(invalid("relative path segments are not allowed"));
    }

    let parsed = url::Url::parse(trimmed).map_err(|e| invalid(&format!("not a valid URL: {e}")))?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("URL has no host"));
    }
    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err(invalid("credentials in the URL are not allowed"));
    }

    Ok(trimmed.to_string())
}

/// A written config file plus the tool arguments that reference it.
///
/// The file is removed when the value is dropped, so an abandoned run still
/// cleans up after itself.
#[derive(Debug)]
pub struct JobConfig {
    path: PathBuf,
    args: Vec<String>,
}

impl JobConfig {
    /// Location of the config file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tool arguments: output format, active flags, then the config path
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Delete the config file. A file that is already gone counts as removed.
    pub fn remove(&self) -> AnalysisResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AnalysisError::ScratchCleanupFailure {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

impl Drop for JobConfig {
    fn drop(&mut self) {
        if let Err(e) = self.remove() {
            tracing::warn!("{}", e);
        }
    }
}

/// Builds one [`JobConfig`] per run inside a scratch directory
#[derive(Debug, Clone)]
pub struct JobConfigBuilder {
    scratch_dir: PathBuf,
}

impl JobConfigBuilder {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Validate the request and write its config file.
    ///
    /// Validation happens before anything touches the filesystem.
    pub fn build(&self, request: &AnalysisRequest) -> AppResult<JobConfig> {
        let name = validate_target(&request.target_url, request.target_type)?;
        let target = TargetDescriptor {
            kind: request.target_type,
            name,
        };

        ensure_dir(&self.scratch_dir)?;
        let path = self
            .scratch_dir
            .join(format!("slim-config-{}.json", Uuid::new_v4()));

        tracing::debug!("Writing job config {} for {}", path.display(), target.name);
        let body = serde_json::to_string_pretty(&JobFile {
            targets: vec![target],
        })?;
        let mut args = vec![
            "--output_format".to_string(),
            request.output_format.as_str().to_string(),
        ];
        args.extend(request.flags.to_args().into_iter().map(String::from));
        args.push(path.display().to_string());

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        // From here a failed write still removes the partial file
        let job = JobConfig { path, args };
        file.write_all(body.as_bytes())?;
        Ok(job)
    }
}
