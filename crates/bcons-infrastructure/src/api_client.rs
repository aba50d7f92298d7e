//! HTTP client for the bcons account API.

use bcons_core::api::UserDataApi;
use bcons_core::error::{BconsError, Result};
use bcons_core::user::{Preferences, UserData};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct UserDataEnvelope {
    data: Option<UserDataBody>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDataBody {
    user_data: Option<UserData>,
}

/// `reqwest`-backed [`UserDataApi`].
#[derive(Clone)]
pub struct HttpUserDataApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUserDataApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn user_data_url(&self, token: &str) -> String {
        format!("{}/userData/{}?fullData=true", self.base_url, token)
    }

    fn preferences_url(&self, token: &str) -> String {
        format!("{}/userPreferences/{}", self.base_url, token)
    }
}

/// Extracts the user data from an API response body.
fn parse_user_data(body: &str) -> Result<UserData> {
    let envelope: UserDataEnvelope = serde_json::from_str(body)?;
    envelope
        .data
        .and_then(|d| d.user_data)
        .ok_or_else(|| BconsError::api("response carries no userData"))
}

#[async_trait::async_trait]
impl UserDataApi for HttpUserDataApi {
    async fn fetch_user_data(&self, token: &str) -> Result<UserData> {
        let response = self
            .client
            .get(self.user_data_url(token))
            .send()
            .await
            .map_err(|e| BconsError::api(format!("user data request failed: {e}")))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(BconsError::api(format!(
                "user data request returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BconsError::api(format!("user data body unreadable: {e}")))?;
        parse_user_data(&body)
    }

    async fn save_preferences(&self, token: &str, preferences: &Preferences) -> Result<()> {
        let response = self
            .client
            .put(self.preferences_url(token))
            .json(&json!({ "preferences": preferences }))
            .send()
            .await
            .map_err(|e| BconsError::api(format!("save preferences request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(BconsError::api(format!(
                "save preferences returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let api = HttpUserDataApi::new("https://bcons.dev/api/");
        assert_eq!(
            api.user_data_url("tok"),
            "https://bcons.dev/api/userData/tok?fullData=true"
        );
        assert_eq!(api.preferences_url("tok"), "https://bcons.dev/api/userPreferences/tok");
    }

    #[test]
    fn test_parse_user_data_envelope() {
        let body = r#"{"data":{"userData":{"token":"tok","wsServers":["wss://a"],"projects":[]}}}"#;
        let data = parse_user_data(body).unwrap();
        assert_eq!(data.token, "tok");
        assert_eq!(data.ws_servers, vec!["wss://a"]);
    }

    #[test]
    fn test_missing_user_data_is_api_error() {
        assert!(matches!(parse_user_data(r#"{"data":{}}"#), Err(BconsError::Api(_))));
        assert!(matches!(parse_user_data(r#"{}"#), Err(BconsError::Api(_))));
        assert!(matches!(
            parse_user_data("<html>"),
            Err(BconsError::Serialization { .. })
        ));
    }
}
