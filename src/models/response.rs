//! Response Types
//!
//! Standard response types for all commands.

use serde::{Deserialize, Serialize};

use slim_leaderboard_core::RunOutcome;

/// Generic command response for all commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> CommandResponse<T> {
    /// Create a successful response with data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response with message
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl<T> From<Result<T, crate::utils::error::AppError>> for CommandResponse<T> {
    fn from(result: Result<T, crate::utils::error::AppError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e.to_string()),
        }
    }
}

/// A run outcome carries its own success flag and error, and the envelope
/// mirrors them so the frontend can check either.
impl From<RunOutcome> for CommandResponse<RunOutcome> {
    fn from(outcome: RunOutcome) -> Self {
        Self {
            success: outcome.success,
            error: outcome.error_message.clone(),
            data: Some(outcome),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
    pub database: bool,
    pub secrets: bool,
    pub config: bool,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            service: "slim-leaderboard-desktop".to_string(),
            database: false,
            secrets: false,
            config: false,
        }
    }
}
