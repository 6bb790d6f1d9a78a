//! Application State
//!
//! Global state shared by every command, containing all services.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::services::analysis::{AnalysisOrchestrator, EnvironmentProbe};
use crate::storage::{ConfigService, CredentialStore, Database, SecretCipher};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, database_path, ensure_app_dir, secret_key_path};

/// Application state
pub struct AppState {
    /// SQLite database with connection pool
    database: Arc<RwLock<Option<Database>>>,
    /// Cipher for secrets at rest
    secrets: Arc<RwLock<Option<SecretCipher>>>,
    /// Configuration service for app settings
    config: Arc<RwLock<Option<ConfigService>>>,
    /// Token and last-analysis persistence
    credentials: Arc<RwLock<Option<CredentialStore>>>,
    /// Single-run analysis coordinator
    orchestrator: Arc<RwLock<Option<Arc<AnalysisOrchestrator>>>>,
    /// Whether the state has been initialized
    initialized: Arc<RwLock<bool>>,
}

fn not_initialized(service: &str) -> AppError {
    AppError::internal(format!("{} not initialized", service))
}

impl AppState {
    /// Create a new uninitialized app state
    pub fn new() -> Self {
        Self {
            database: Arc::new(RwLock::new(None)),
            secrets: Arc::new(RwLock::new(None)),
            config: Arc::new(RwLock::new(None)),
            credentials: Arc::new(RwLock::new(None)),
            orchestrator: Arc::new(RwLock::new(None)),
            initialized: Arc::new(RwLock::new(false)),
        }
    }

    /// Initialize all services under ~/.slim-leaderboard/
    pub async fn initialize(&self) -> AppResult<()> {
        ensure_app_dir()?;
        self.initialize_with(database_path()?, secret_key_path()?, config_path()?)
            .await
    }

    /// Initialize all services with their files inside `dir`
    pub async fn initialize_in(&self, dir: &Path) -> AppResult<()> {
        self.initialize_with(
            dir.join("data.db"),
            dir.join("secret.key"),
            dir.join("config.json"),
        )
        .await
    }

    async fn initialize_with(
        &self,
        db_path: PathBuf,
        key_path: PathBuf,
        config_path: PathBuf,
    ) -> AppResult<()> {
        let mut initialized = self.initialized.write().await;
        if *initialized {
            return Ok(());
        }

        let db = Database::open(&db_path)?;
        let cipher = SecretCipher::load_or_create(&key_path)?;
        let config = ConfigService::open(config_path)?;

        let store = CredentialStore::new(db.clone(), cipher.clone());
        let orchestrator = AnalysisOrchestrator::from_config(store.clone(), config.get_config());

        *self.database.write().await = Some(db);
        *self.secrets.write().await = Some(cipher);
        *self.config.write().await = Some(config);
        *self.credentials.write().await = Some(store);
        *self.orchestrator.write().await = Some(Arc::new(orchestrator));

        *initialized = true;
        tracing::info!("Application state initialized ({})", db_path.display());
        Ok(())
    }

    /// Whether `initialize` has completed
    pub async fn is_initialized(&self) -> bool {
        *self.initialized.read().await
    }

    /// Check if database is healthy
    pub fn is_database_healthy(&self) -> bool {
        // Use try_read to avoid blocking
        if let Ok(guard) = self.database.try_read() {
            if let Some(ref db) = *guard {
                return db.is_healthy();
            }
        }
        false
    }

    /// Check if the secret cipher is loaded
    pub fn is_secrets_healthy(&self) -> bool {
        self.secrets
            .try_read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Check if config is healthy
    pub fn is_config_healthy(&self) -> bool {
        if let Ok(guard) = self.config.try_read() {
            if let Some(ref config) = *guard {
                return config.is_healthy();
            }
        }
        false
    }

    /// Get the current configuration
    pub async fn get_config(&self) -> AppResult<AppConfig> {
        let guard = self.config.read().await;
        match &*guard {
            Some(config) => Ok(config.get_config_clone()),
            None => Err(AppError::config("Config service not initialized")),
        }
    }

    /// Update the configuration and hand it to the orchestrator
    pub async fn update_config(&self, update: SettingsUpdate) -> AppResult<AppConfig> {
        let updated = {
            let mut guard = self.config.write().await;
            match &mut *guard {
                Some(config) => config.update_config(update)?,
                None => return Err(AppError::config("Config service not initialized")),
            }
        };
        self.orchestrator().await?.reconfigure(&updated).await;
        Ok(updated)
    }

    /// Credential store handle
    pub async fn credentials(&self) -> AppResult<CredentialStore> {
        self.credentials
            .read()
            .await
            .clone()
            .ok_or_else(|| not_initialized("Credential store"))
    }

    /// Orchestrator handle. The lock is released before the caller runs anything.
    pub async fn orchestrator(&self) -> AppResult<Arc<AnalysisOrchestrator>> {
        self.orchestrator
            .read()
            .await
            .clone()
            .ok_or_else(|| not_initialized("Analysis orchestrator"))
    }

    /// A probe for the currently configured interpreter
    pub async fn environment_probe(&self) -> AppResult<EnvironmentProbe> {
        Ok(EnvironmentProbe::from_config(&self.get_config().await?))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
