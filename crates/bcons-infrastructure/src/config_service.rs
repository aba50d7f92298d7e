//! Relay configuration loading.

use std::fs;
use std::path::{Path, PathBuf};

use bcons_core::config::RelayConfig;
use bcons_core::error::Result;

use crate::paths::BconsPaths;

/// Loads `config.toml`, writing the defaults on first use.
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    /// Uses the default location (`~/.config/bcons/config.toml`).
    pub fn new_default() -> Result<Self> {
        Ok(Self {
            path: BconsPaths::config_file()?,
        })
    }

    /// Uses a custom path (CLI override, tests).
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_or_create(&self) -> Result<RelayConfig> {
        if !self.path.exists() {
            let config = RelayConfig::default();
            self.save(&config)?;
            tracing::info!(path = %self.path.display(), "created default config");
            return Ok(config);
        }

        let content = fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, config: &RelayConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, toml::to_string_pretty(config)?)?;
        Ok(())
    }
}
