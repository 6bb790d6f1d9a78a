//! Credential Store
//!
//! Durable home of the GitHub token and the last successful analysis. Both
//! records are single rows in the `settings` table, keyed independently. The
//! token is encrypted before it reaches the database and is never logged.

use slim_leaderboard_core::LastAnalysisRecord;

use crate::storage::database::Database;
use crate::storage::secrets::SecretCipher;
use crate::utils::error::{AppError, AppResult};

const TOKEN_KEY: &str = "github_token";
const LAST_ANALYSIS_KEY: &str = "last_analysis";

/// Persistence for the credential and the last analysis record
#[derive(Debug, Clone)]
pub struct CredentialStore {
    db: Database,
    cipher: SecretCipher,
}

impl CredentialStore {
    pub fn new(db: Database, cipher: SecretCipher) -> Self {
        Self { db, cipher }
    }

    /// Store a token exactly as given, replacing any existing one
    pub fn set_token(&self, token: &str) -> AppResult<()> {
        if token.trim().is_empty() {
            return Err(AppError::validation("GitHub token must not be empty"));
        }
        let encrypted = self.cipher.encrypt(token)?;
        self.db.set_setting(TOKEN_KEY, &encrypted)?;
        tracing::info!("GitHub token updated");
        Ok(())
    }

    /// Read the stored token, if any.
    ///
    /// A token that no longer decrypts (key file replaced) reads as absent.
    pub fn get_token(&self) -> AppResult<Option<String>> {
        let Some(encrypted) = self.db.get_setting(TOKEN_KEY)? else {
            return Ok(None);
        };
        match self.cipher.decrypt(&encrypted) {
            Ok(token) => Ok(Some(token)),
            Err(AppError::Secret(reason)) => {
                tracing::warn!("Ignoring unreadable GitHub token: {}", reason);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Whether a readable token is stored
    pub fn has_token(&self) -> bool {
        match self.get_token() {
            Ok(token) => token.is_some(),
            Err(e) => {
                tracing::warn!("Stored GitHub token is unreadable: {}", e);
                false
            }
        }
    }

    /// Remove the token. Clearing an absent token succeeds.
    pub fn clear_token(&self) -> AppResult<()> {
        self.db.delete_setting(TOKEN_KEY)?;
        tracing::info!("GitHub token cleared");
        Ok(())
    }

    /// Overwrite the last analysis record.
    ///
    /// Failures are logged and swallowed: losing the cache must never fail
    /// the run that produced it.
    pub fn save_last_analysis(&self, record: &LastAnalysisRecord) {
        let result = serde_json::to_string(record)
            .map_err(AppError::from)
            .and_then(|json| self.db.set_setting(LAST_ANALYSIS_KEY, &json));

        match result {
            Ok(()) => tracing::debug!("Saved last analysis for {}", record.target_url),
            Err(e) => tracing::warn!(
                "Failed to save last analysis for {}: {}",
                record.target_url,
                e
            ),
        }
    }

    /// The most recent successful analysis, if one was recorded
    pub fn get_last_analysis(&self) -> Option<LastAnalysisRecord> {
        let raw = match self.db.get_setting(LAST_ANALYSIS_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!("Failed to read last analysis: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Ignoring corrupt last analysis record: {}", e);
                None
            }
        }
    }
}
