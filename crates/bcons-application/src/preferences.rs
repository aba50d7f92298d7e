//! Console settings edits coming from the renderer side.

use std::collections::BTreeMap;
use std::sync::Arc;

use bcons_core::bus::{BusMessage, MessageBus};
use bcons_core::error::{BconsError, Result};
use bcons_core::user::{ConsoleSettings, Preferences, UserDataRepository};

pub struct PreferencesService {
    repository: Arc<dyn UserDataRepository>,
    bus: MessageBus,
}

impl PreferencesService {
    pub fn new(repository: Arc<dyn UserDataRepository>, bus: MessageBus) -> Self {
        Self { repository, bus }
    }

    /// Replaces every console settings entry, persists the user data and
    /// announces the new preferences to the other contexts.
    pub async fn update_console_settings(
        &self,
        console_settings: BTreeMap<String, ConsoleSettings>,
    ) -> Result<Preferences> {
        let mut data = self
            .repository
            .get()
            .await?
            .ok_or_else(|| BconsError::configuration("no user data stored"))?;

        data.preferences.console_settings = console_settings;
        let preferences = data.preferences.clone();
        let token = data.token.clone();
        self.repository.set(data).await?;

        self.bus.publish(BusMessage::PreferencesChanged {
            preferences: preferences.clone(),
            token,
        });
        Ok(preferences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcons_core::message::MessageType;
    use bcons_core::user::UserData;
    use bcons_infrastructure::InMemoryUserDataRepository;
    use serde_json::json;

    #[tokio::test]
    async fn test_update_persists_and_publishes() {
        let mut stored = UserData {
            token: "tok".into(),
            ..Default::default()
        };
        stored.preferences.other.insert("theme".into(), json!("dark"));
        let repository = Arc::new(InMemoryUserDataRepository::new(Some(stored)));
        let bus = MessageBus::new(8);
        let mut rx = bus.subscribe();
        let service = PreferencesService::new(repository.clone(), bus);

        let mut settings = BTreeMap::new();
        settings.insert(
            "default".to_string(),
            ConsoleSettings {
                send_console: true,
                send_console_tabs: vec![MessageType::Error],
                ..Default::default()
            },
        );
        let prefs = service.update_console_settings(settings).await.unwrap();
        assert_eq!(prefs.other["theme"], "dark");

        let persisted = repository.get().await.unwrap().unwrap();
        assert_eq!(persisted.preferences, prefs);

        match rx.try_recv() {
            Some(BusMessage::PreferencesChanged { preferences, token }) => {
                assert_eq!(token, "tok");
                assert_eq!(preferences, prefs);
            }
            other => panic!("unexpected bus message: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_without_user_data_fails() {
        let repository = Arc::new(InMemoryUserDataRepository::new(None));
        let service = PreferencesService::new(repository, MessageBus::new(8));
        let err = service.update_console_settings(BTreeMap::new()).await.unwrap_err();
        assert!(err.is_configuration());
    }
}
