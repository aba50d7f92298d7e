//! Error types for the bcons relay.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for every bcons crate.
///
/// The first five variants follow the per-message failure taxonomy: they are
/// contained to the message or navigation that caused them and never halt a
/// context. The remaining variants cover collaborator plumbing.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum BconsError {
    /// No user data, no matching project, or missing token/servers.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Missing decrypt key or cryptographic failure.
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// JSON body or extra data could not be parsed.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// Message belongs to a project that is no longer active.
    #[error("Stale message for project '{project_id}'")]
    StaleMessage { project_id: String },

    /// Connection state problem reported by the transport collaborator.
    #[error("Transport error: {0}")]
    Transport(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Data access error (persistence and secret store)
    #[error("Data access error: {0}")]
    DataAccess(String),

    /// Remote API error
    #[error("API error: {0}")]
    Api(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BconsError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn decryption(message: impl Into<String>) -> Self {
        Self::Decryption(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedMessage(message.into())
    }

    pub fn stale(project_id: impl Into<String>) -> Self {
        Self::StaleMessage {
            project_id: project_id.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::Api(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_decryption(&self) -> bool {
        matches!(self, Self::Decryption(_))
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedMessage(_))
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleMessage { .. })
    }

    /// Whether the error only affects a single message.
    ///
    /// Per-message errors are logged and the message dropped; the context
    /// keeps processing the next one.
    pub fn is_per_message(&self) -> bool {
        matches!(
            self,
            Self::Decryption(_) | Self::MalformedMessage(_) | Self::StaleMessage { .. }
        )
    }
}

impl From<std::io::Error> for BconsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for BconsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for BconsError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for BconsError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for BconsError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, BconsError>`.
pub type Result<T> = std::result::Result<T, BconsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_message_classification() {
        assert!(BconsError::decryption("bad key").is_per_message());
        assert!(BconsError::malformed("bad json").is_per_message());
        assert!(BconsError::stale("p1").is_per_message());
        assert!(!BconsError::configuration("no user data").is_per_message());
        assert!(!BconsError::transport("closed").is_per_message());
    }

    #[test]
    fn test_json_error_conversion() {
        let err: BconsError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        match err {
            BconsError::Serialization { format, .. } => assert_eq!(format, "JSON"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
