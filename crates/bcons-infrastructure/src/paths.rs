//! Unified path management for bcons files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/bcons/             # Config directory (platform config dir)
//! ├── config.toml              # Relay configuration
//! ├── user_data.json           # Synced user data cache
//! ├── secrets.json             # Device-local decrypt passphrases (600)
//! └── net_rules.json           # Installed header rules
//! ```
//!
//! `data_dir` in `config.toml` moves everything except `config.toml`.

use std::path::{Path, PathBuf};

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for bcons_core::BconsError {
    fn from(e: PathError) -> Self {
        bcons_core::BconsError::configuration(e.to_string())
    }
}

/// File locations of one installation.
#[derive(Debug, Clone)]
pub struct BconsPaths {
    data_dir: PathBuf,
}

impl BconsPaths {
    /// Paths rooted at `data_dir`, or at the default config directory.
    pub fn new(data_dir: Option<&Path>) -> Result<Self, PathError> {
        let data_dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => Self::config_dir()?,
        };
        Ok(Self { data_dir })
    }

    /// The bcons configuration directory (e.g. `~/.config/bcons/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|d| d.join("bcons"))
            .ok_or(PathError::ConfigDirNotFound)
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn user_data_file(&self) -> PathBuf {
        self.data_dir.join("user_data.json")
    }

    /// # Security Note
    ///
    /// Written with mode 600 on unix.
    pub fn secrets_file(&self) -> PathBuf {
        self.data_dir.join("secrets.json")
    }

    pub fn net_rules_file(&self) -> PathBuf {
        self.data_dir.join("net_rules.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_roots_every_file() {
        let paths = BconsPaths::new(Some(Path::new("/tmp/bcons-test"))).unwrap();
        assert_eq!(paths.user_data_file(), Path::new("/tmp/bcons-test/user_data.json"));
        assert_eq!(paths.secrets_file(), Path::new("/tmp/bcons-test/secrets.json"));
        assert_eq!(paths.net_rules_file(), Path::new("/tmp/bcons-test/net_rules.json"));
    }
}
