//! `bcons` subcommands and the state they share.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use bcons_core::config::RelayConfig;
use bcons_core::user::{UserData, UserDataRepository};
use bcons_infrastructure::{
    BconsPaths, ConfigService, FileNetRuleStore, FileSecretStore, HttpUserDataApi,
    JsonUserDataRepository,
};

pub mod refresh;
pub mod replay;
pub mod resolve;
pub mod set_key;
pub mod show;
pub mod status;

/// Loaded configuration plus the file locations it points at.
pub struct AppContext {
    pub config: RelayConfig,
    pub paths: BconsPaths,
}

impl AppContext {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let service = match config_path {
            Some(path) => ConfigService::with_path(path),
            None => ConfigService::new_default().context("Failed to locate config directory")?,
        };
        let config = service
            .load_or_create()
            .with_context(|| format!("Failed to load {}", service.path().display()))?;
        let paths = BconsPaths::new(config.data_dir.as_deref())?;
        Ok(Self { config, paths })
    }

    pub fn repository(&self) -> Arc<JsonUserDataRepository> {
        Arc::new(JsonUserDataRepository::new(self.paths.user_data_file()))
    }

    pub fn secrets(&self) -> Arc<FileSecretStore> {
        Arc::new(FileSecretStore::new(self.paths.secrets_file()))
    }

    pub fn api(&self) -> Arc<HttpUserDataApi> {
        Arc::new(HttpUserDataApi::new(self.config.api_base_url.clone()))
    }

    pub fn net_rules(&self) -> Arc<FileNetRuleStore> {
        Arc::new(FileNetRuleStore::new(self.paths.net_rules_file()))
    }

    /// Stored user data; fails with a hint when none has been fetched yet.
    pub async fn user_data(&self) -> Result<UserData> {
        self.repository()
            .get()
            .await?
            .context("No user data stored; run `bcons refresh --token <token>` first")
    }
}
