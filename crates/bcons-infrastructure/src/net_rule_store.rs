//! Header rule installation.

use std::path::PathBuf;
use std::sync::Arc;

use bcons_core::error::{BconsError, Result};
use bcons_core::net_rules::{HeaderRule, NetRuleService};
use tokio::sync::Mutex;

use crate::storage::AtomicJsonFile;

/// Persists the installed rule set to `net_rules.json` for the request
/// layer to pick up.
#[derive(Clone)]
pub struct FileNetRuleStore {
    file: Arc<Mutex<AtomicJsonFile<Vec<HeaderRule>>>>,
}

impl FileNetRuleStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(Mutex::new(AtomicJsonFile::new(path))),
        }
    }

    pub async fn installed(&self) -> Result<Vec<HeaderRule>> {
        let file = self.file.lock().await;
        Ok(file.load()?.unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl NetRuleService for FileNetRuleStore {
    async fn install(&self, rule: HeaderRule) -> Result<()> {
        let file = self.file.clone();
        tracing::debug!(
            domains = rule.request_domains.len(),
            "installing header rule"
        );
        tokio::task::spawn_blocking(move || {
            let file = file.blocking_lock();
            file.save(&vec![rule]).map_err(BconsError::from)
        })
        .await
        .map_err(|e| BconsError::internal(format!("Failed to join task: {}", e)))?
    }
}

/// Keeps every installed rule in memory, for tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingNetRules {
    installs: Arc<std::sync::Mutex<Vec<HeaderRule>>>,
}

impl RecordingNetRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every rule passed to `install`, oldest first.
    pub fn installs(&self) -> Vec<HeaderRule> {
        self.installs.lock().map(|i| i.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl NetRuleService for RecordingNetRules {
    async fn install(&self, rule: HeaderRule) -> Result<()> {
        self.installs
            .lock()
            .map_err(|_| BconsError::internal("net rule record poisoned"))?
            .push(rule);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcons_core::user::UserData;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_install_replaces_previous_rules() {
        let dir = TempDir::new().unwrap();
        let store = FileNetRuleStore::new(dir.path().join("net_rules.json"));

        let mut data = UserData {
            token: "first".into(),
            ..Default::default()
        };
        store.install(HeaderRule::for_user(&data)).await.unwrap();
        data.token = "second".into();
        store.install(HeaderRule::for_user(&data)).await.unwrap();

        let rules = store.installed().await.unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].value, "second");
    }
}
