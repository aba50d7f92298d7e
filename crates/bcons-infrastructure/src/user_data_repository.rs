//! User data persistence.

use std::path::PathBuf;
use std::sync::Arc;

use bcons_core::error::{BconsError, Result};
use bcons_core::user::{UserData, UserDataRepository};
use tokio::sync::{Mutex, RwLock};

use crate::storage::AtomicJsonFile;

/// Stores user data as `user_data.json`.
///
/// Every `get` re-reads the file so edits made by another process are
/// picked up on the next navigation.
#[derive(Clone)]
pub struct JsonUserDataRepository {
    /// Serializes writers within this process.
    file: Arc<Mutex<AtomicJsonFile<UserData>>>,
}

impl JsonUserDataRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(Mutex::new(AtomicJsonFile::new(path))),
        }
    }
}

#[async_trait::async_trait]
impl UserDataRepository for JsonUserDataRepository {
    async fn get(&self) -> Result<Option<UserData>> {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || {
            let file = file.blocking_lock();
            file.load().map_err(BconsError::from)
        })
        .await
        .map_err(|e| BconsError::internal(format!("Failed to join task: {}", e)))?
    }

    async fn set(&self, user_data: UserData) -> Result<()> {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || {
            let file = file.blocking_lock();
            file.save(&user_data).map_err(BconsError::from)
        })
        .await
        .map_err(|e| BconsError::internal(format!("Failed to join task: {}", e)))?
    }
}

/// In-memory user data, for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDataRepository {
    data: Arc<RwLock<Option<UserData>>>,
}

impl InMemoryUserDataRepository {
    pub fn new(initial: Option<UserData>) -> Self {
        Self {
            data: Arc::new(RwLock::new(initial)),
        }
    }
}

#[async_trait::async_trait]
impl UserDataRepository for InMemoryUserDataRepository {
    async fn get(&self) -> Result<Option<UserData>> {
        Ok(self.data.read().await.clone())
    }

    async fn set(&self, user_data: UserData) -> Result<()> {
        *self.data.write().await = Some(user_data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcons_core::project::Project;
    use tempfile::TempDir;

    fn sample() -> UserData {
        UserData {
            token: "tok".into(),
            name: "Ada".into(),
            ws_servers: vec!["wss://a".into()],
            projects: vec![Project {
                id: "p1".into(),
                name: "Shop".into(),
                a_domains: vec!["shop.test".into()],
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_json_repository_round_trip() {
        let dir = TempDir::new().unwrap();
        let repo = JsonUserDataRepository::new(dir.path().join("user_data.json"));

        assert!(repo.get().await.unwrap().is_none());

        repo.set(sample()).await.unwrap();
        assert_eq!(repo.get().await.unwrap(), Some(sample()));
    }

    #[tokio::test]
    async fn test_json_repository_sees_external_edits() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("user_data.json");
        let repo = JsonUserDataRepository::new(path.clone());
        repo.set(sample()).await.unwrap();

        std::fs::write(&path, r#"{"token":"other","projects":[]}"#).unwrap();
        let loaded = repo.get().await.unwrap().unwrap();
        assert_eq!(loaded.token, "other");
    }

    #[tokio::test]
    async fn test_in_memory_repository() {
        let repo = InMemoryUserDataRepository::default();
        assert!(repo.get().await.unwrap().is_none());
        repo.set(sample()).await.unwrap();
        assert_eq!(repo.get().await.unwrap().unwrap().token, "tok");
    }
}
