//! Settings Models
//!
//! Application configuration and settings data structures.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Python module that implements the leaderboard tool
pub const DEFAULT_TOOL_MODULE: &str = "jpl.slim.leaderboard";

/// Interpreter used when no explicit path is configured
pub fn default_python_path() -> String {
    if cfg!(windows) {
        "python".to_string()
    } else {
        "python3".to_string()
    }
}

fn default_tool_module() -> String {
    DEFAULT_TOOL_MODULE.to_string()
}

/// Application configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Python interpreter; platform default when unset
    #[serde(default)]
    pub python_path: Option<String>,
    /// Directory holding the tool's sources, exported as PYTHONPATH
    #[serde(default)]
    pub tool_path: Option<String>,
    /// Module passed to `python -m`
    #[serde(default = "default_tool_module")]
    pub tool_module: String,
    /// Directory for per-run config files; OS temp dir when unset
    #[serde(default)]
    pub scratch_dir: Option<String>,
    /// Kill a run that takes longer than this many seconds
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            python_path: None,
            tool_path: None,
            tool_module: default_tool_module(),
            scratch_dir: None,
            run_timeout_secs: None,
        }
    }
}

/// Settings update request (partial update)
///
/// An empty string clears an optional path field; a zero timeout clears
/// the timeout.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub python_path: Option<String>,
    pub tool_path: Option<String>,
    pub tool_module: Option<String>,
    pub scratch_dir: Option<String>,
    pub run_timeout_secs: Option<u64>,
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(python_path) = update.python_path {
            self.python_path = non_empty(python_path);
        }
        if let Some(tool_path) = update.tool_path {
            self.tool_path = non_empty(tool_path);
        }
        if let Some(tool_module) = update.tool_module {
            self.tool_module = tool_module.trim().to_string();
        }
        if let Some(scratch_dir) = update.scratch_dir {
            self.scratch_dir = non_empty(scratch_dir);
        }
        if let Some(timeout) = update.run_timeout_secs {
            self.run_timeout_secs = if timeout == 0 { None } else { Some(timeout) };
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.tool_module.is_empty() {
            return Err("tool_module must not be empty".to_string());
        }
        if self
            .tool_module
            .split('.')
            .any(|part| part.is_empty() || !part.chars().all(|c| c.is_alphanumeric() || c == '_'))
        {
            return Err(format!("Invalid tool_module: {}", self.tool_module));
        }
        if self.run_timeout_secs == Some(0) {
            return Err("run_timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Interpreter to launch
    pub fn python(&self) -> String {
        self.python_path.clone().unwrap_or_else(default_python_path)
    }

    /// Directory for scratch job configs
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(crate::utils::paths::default_scratch_dir)
    }

    /// Optional wall-clock limit for a run
    pub fn run_timeout(&self) -> Option<Duration> {
        self.run_timeout_secs.map(Duration::from_secs)
    }

    /// requirements.txt next to the tool's source directory
    pub fn requirements_path(&self) -> Option<PathBuf> {
        let tool_path = PathBuf::from(self.tool_path.as_ref()?);
        let root = tool_path.parent().unwrap_or(&tool_path);
        Some(root.join("requirements.txt"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.tool_module, "jpl.slim.leaderboard");
        assert!(config.python_path.is_none());
        assert!(config.run_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_update() {
        let mut config = AppConfig::default();
        let update = SettingsUpdate {
            python_path: Some("/usr/bin/python3.11".to_string()),
            run_timeout_secs: Some(600),
            ..Default::default()
        };
        config.apply_update(update);
        assert_eq!(config.python(), "/usr/bin/python3.11");
        assert_eq!(config.run_timeout(), Some(Duration::from_secs(600)));
        // Other fields should remain unchanged
        assert_eq!(config.tool_module, DEFAULT_TOOL_MODULE);
    }

    #[test]
    fn test_update_clears_with_empty_values() {
        let mut config = AppConfig {
            tool_path: Some("/opt/slim/src".to_string()),
            run_timeout_secs: Some(30),
            ..Default::default()
        };
        config.apply_update(SettingsUpdate {
            tool_path: Some("  ".to_string()),
            run_timeout_secs: Some(0),
            ..Default::default()
        });
        assert!(config.tool_path.is_none());
        assert!(config.run_timeout_secs.is_none());
    }

    #[test]
    fn test_validate_invalid_module() {
        let mut config = AppConfig::default();
        config.tool_module = "jpl..leaderboard".to_string();
        assert!(config.validate().is_err());
        config.tool_module = "jpl.slim;rm".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_requirements_path_sits_beside_sources() {
        let config = AppConfig {
            tool_path: Some("/opt/slim-leaderboard/src".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.requirements_path(),
            Some(PathBuf::from("/opt/slim-leaderboard/requirements.txt"))
        );
        assert!(AppConfig::default().requirements_path().is_none());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
