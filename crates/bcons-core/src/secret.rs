//! Secret-store collaborator.
//!
//! Decrypt passphrases are device-local: they are never part of the synced
//! user data.

use async_trait::async_trait;

use crate::error::Result;

/// Storage key of a project's passphrase.
pub fn decrypt_key_name(project_id: &str) -> String {
    format!("pass_{project_id}")
}

#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_decrypt_key(&self, project_id: &str) -> Result<Option<String>>;

    async fn set_decrypt_key(&self, project_id: &str, passphrase: &str) -> Result<()>;
}
