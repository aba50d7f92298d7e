//! Device-local decrypt passphrase storage.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use bcons_core::error::{BconsError, Result};
use bcons_core::secret::{SecretStore, decrypt_key_name};
use tokio::sync::{Mutex, RwLock};

use crate::storage::AtomicJsonFile;

/// Stores passphrases in `secrets.json` (mode 600), keyed `pass_<project>`.
///
/// # Security Note
///
/// Passphrases are never logged and never leave this device.
#[derive(Clone)]
pub struct FileSecretStore {
    file: Arc<Mutex<AtomicJsonFile<BTreeMap<String, String>>>>,
}

impl FileSecretStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(Mutex::new(AtomicJsonFile::new(path).with_mode(0o600))),
        }
    }
}

#[async_trait::async_trait]
impl SecretStore for FileSecretStore {
    async fn get_decrypt_key(&self, project_id: &str) -> Result<Option<String>> {
        let key = decrypt_key_name(project_id);
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || {
            let file = file.blocking_lock();
            let secrets = file.load().map_err(BconsError::from)?.unwrap_or_default();
            Ok(secrets.get(&key).filter(|v| !v.is_empty()).cloned())
        })
        .await
        .map_err(|e| BconsError::internal(format!("Failed to join task: {}", e)))?
    }

    async fn set_decrypt_key(&self, project_id: &str, passphrase: &str) -> Result<()> {
        let key = decrypt_key_name(project_id);
        let passphrase = passphrase.to_string();
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || {
            let file = file.blocking_lock();
            let mut secrets = file.load().map_err(BconsError::from)?.unwrap_or_default();
            secrets.insert(key, passphrase);
            file.save(&secrets).map_err(BconsError::from)
        })
        .await
        .map_err(|e| BconsError::internal(format!("Failed to join task: {}", e)))?
    }
}

/// In-memory secret store, for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemorySecretStore {
    keys: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(project_id: &str, passphrase: &str) -> Self {
        let mut keys = HashMap::new();
        keys.insert(decrypt_key_name(project_id), passphrase.to_string());
        Self {
            keys: Arc::new(RwLock::new(keys)),
        }
    }
}

#[async_trait::async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get_decrypt_key(&self, project_id: &str) -> Result<Option<String>> {
        Ok(self.keys.read().await.get(&decrypt_key_name(project_id)).cloned())
    }

    async fn set_decrypt_key(&self, project_id: &str, passphrase: &str) -> Result<()> {
        self.keys
            .write()
            .await
            .insert(decrypt_key_name(project_id), passphrase.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("secrets.json");
        let store = FileSecretStore::new(path.clone());

        assert!(store.get_decrypt_key("p1").await.unwrap().is_none());

        store.set_decrypt_key("p1", "hunter2").await.unwrap();
        store.set_decrypt_key("p2", "swordfish").await.unwrap();

        assert_eq!(store.get_decrypt_key("p1").await.unwrap().as_deref(), Some("hunter2"));
        assert_eq!(store.get_decrypt_key("p2").await.unwrap().as_deref(), Some("swordfish"));

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("pass_p1"));
    }

    #[tokio::test]
    async fn test_empty_passphrase_counts_as_missing() {
        let dir = TempDir::new().unwrap();
        let store = FileSecretStore::new(dir.path().join("secrets.json"));
        store.set_decrypt_key("p1", "").await.unwrap();
        assert!(store.get_decrypt_key("p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemorySecretStore::with_key("p1", "k");
        assert_eq!(store.get_decrypt_key("p1").await.unwrap().as_deref(), Some("k"));
        assert!(store.get_decrypt_key("p2").await.unwrap().is_none());
    }
}
