//! Background service.
//!
//! Installation-wide work that is not tied to one inspected page: keeping
//! user data fresh, installing the header rule, syncing preferences back to
//! the account, and turning raw navigation events into `page-navigated`.

use std::sync::Arc;

use bcons_core::api::UserDataApi;
use bcons_core::bus::{BusMessage, ContextId};
use bcons_core::error::{BconsError, Result};
use bcons_core::net_rules::{HeaderRule, NetRuleService};
use bcons_core::user::{Preferences, UserData, UserDataRepository};

pub struct BackgroundService {
    repository: Arc<dyn UserDataRepository>,
    api: Arc<dyn UserDataApi>,
    net_rules: Arc<dyn NetRuleService>,
}

impl BackgroundService {
    pub fn new(
        repository: Arc<dyn UserDataRepository>,
        api: Arc<dyn UserDataApi>,
        net_rules: Arc<dyn NetRuleService>,
    ) -> Self {
        Self {
            repository,
            api,
            net_rules,
        }
    }

    /// Downloads the user data for `token`, installs the header rule for its
    /// domains and persists it.
    pub async fn refresh_user_data(&self, token: &str) -> Result<UserData> {
        let token = token.trim();
        if token.is_empty() {
            return Err(BconsError::configuration("no user token"));
        }

        let data = self.api.fetch_user_data(token).await?;

        if let Err(e) = self.net_rules.install(HeaderRule::for_user(&data)).await {
            tracing::error!("failed to install header rule: {}", e);
        }
        self.repository.set(data.clone()).await?;

        tracing::info!(projects = data.projects.len(), "user data refreshed");
        Ok(data)
    }

    /// Refreshes using the token already in persistence.
    ///
    /// Returns `None` when no token is stored yet.
    pub async fn refresh_stored(&self) -> Result<Option<UserData>> {
        let token = self.repository.get().await?.map(|d| d.token);
        match token {
            Some(token) if !token.trim().is_empty() => self.refresh_user_data(&token).await.map(Some),
            _ => {
                tracing::debug!("no stored token, skipping user data refresh");
                Ok(None)
            }
        }
    }

    /// Runs once after installation.
    pub async fn on_installed(&self) -> Result<Option<UserData>> {
        self.refresh_stored().await
    }

    /// Stores edited preferences on the account. Not retried.
    pub async fn on_preferences_changed(&self, token: &str, preferences: &Preferences) -> Result<()> {
        self.api.save_preferences(token, preferences).await
    }

    /// Shortened form of the stored token, safe to show: the first and last
    /// six characters.
    pub async fn token_hint(&self) -> Result<Option<String>> {
        let token = self
            .repository
            .get()
            .await?
            .map(|d| d.token)
            .filter(|t| !t.is_empty());
        Ok(token.map(|t| token_hint(&t)))
    }

    /// Reacts to bus traffic meant for the background context.
    pub async fn handle_bus(&self, message: BusMessage) {
        if let BusMessage::PreferencesChanged { preferences, token } = message {
            if let Err(e) = self.on_preferences_changed(&token, &preferences).await {
                tracing::error!("failed to save preferences to the API: {}", e);
            }
        }
    }
}

fn token_hint(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return token.to_string();
    }
    let head: String = chars.iter().take(6).collect();
    let tail: String = chars[chars.len().saturating_sub(6)..].iter().collect();
    format!("{head}{tail}")
}

/// Collapses repeated navigation events for the same URL.
///
/// Full navigations and in-page history updates both report the URL, often
/// more than once; only a change is worth a re-resolution.
#[derive(Debug, Default)]
pub struct NavigationWatcher {
    last_url: Option<String>,
}

impl NavigationWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, context_id: &str, url: &str) -> Option<BusMessage> {
        if self.last_url.as_deref() == Some(url) {
            return None;
        }
        self.last_url = Some(url.to_string());
        Some(BusMessage::PageNavigated {
            context_id: ContextId::from(context_id),
            url: url.to_string(),
        })
    }
}
