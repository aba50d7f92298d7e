use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::transport::BROWSER_EXTENSION_DEVICE;

pub const DEFAULT_API_BASE_URL: &str = "https://bcons.dev/api";

/// Relay configuration, stored as `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RelayConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Device tag announced to the transport.
    #[serde(default = "default_device")]
    pub device: String,
    /// Messages retained per bus subscriber before the slowest one lags.
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Overrides the directory holding user data, secrets and rules.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_device() -> String {
    BROWSER_EXTENSION_DEVICE.to_string()
}

fn default_bus_capacity() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            device: default_device(),
            bus_capacity: default_bus_capacity(),
            log_level: default_log_level(),
            data_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: RelayConfig = toml::from_str("").unwrap();
        assert_eq!(config, RelayConfig::default());
        assert_eq!(config.api_base_url, "https://bcons.dev/api");
        assert_eq!(config.device, "BE");
    }

    #[test]
    fn test_partial_override() {
        let config: RelayConfig = toml::from_str(
            r#"
            log_level = "debug"
            data_dir = "/tmp/bcons"
            "#,
        )
        .unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/bcons")));
        assert_eq!(config.bus_capacity, 256);
    }
}
