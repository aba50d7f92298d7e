//! User data domain model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::message::MessageType;
use crate::message::lenient;
use crate::project::Project;

/// Key of the console settings used when a project has none of its own.
pub const DEFAULT_SETTINGS_KEY: &str = "default";

/// Per-project console output settings.
///
/// Unknown keys written by other settings editors are kept in `other` so a
/// save round-trip never loses them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleSettings {
    #[serde(default, deserialize_with = "lenient::truthy")]
    pub send_console: bool,
    /// Message types mirrored to the console.
    #[serde(default)]
    pub send_console_tabs: Vec<MessageType>,
    #[serde(default, deserialize_with = "lenient::truthy")]
    pub hide_console_icon: bool,
    #[serde(default, deserialize_with = "lenient::truthy")]
    pub hide_console_url: bool,
    #[serde(default, deserialize_with = "lenient::truthy")]
    pub hide_console_file: bool,
    #[serde(default, deserialize_with = "lenient::truthy")]
    pub hide_console_domain: bool,
    /// Comma-separated list.
    #[serde(default, deserialize_with = "lenient::string_or_number")]
    pub hidden_domains: String,
    /// Comma-separated list of endpoints (URLs without query string).
    #[serde(default, deserialize_with = "lenient::string_or_number")]
    pub hidden_urls: String,
    /// Comma-separated list of file base names.
    #[serde(default, deserialize_with = "lenient::string_or_number")]
    pub hidden_files: String,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ConsoleSettings {
    /// Whether messages of type `mt` are sent to the console at all.
    pub fn allows(&self, mt: &MessageType) -> bool {
        self.send_console && self.send_console_tabs.contains(mt)
    }

    pub fn hides_domain(&self, domain: &str) -> bool {
        list_contains(&self.hidden_domains, domain)
    }

    pub fn hides_url(&self, endpoint: &str) -> bool {
        list_contains(&self.hidden_urls, endpoint)
    }

    pub fn hides_file(&self, basename: &str) -> bool {
        list_contains(&self.hidden_files, basename)
    }
}

/// Exact match of `value` against a trimmed comma-separated list.
///
/// Empty values never match, so a blank field is never suppressed.
fn list_contains(list: &str, value: &str) -> bool {
    if value.is_empty() || list.trim().is_empty() {
        return false;
    }
    list.split(',').any(|item| item.trim() == value)
}

/// User preferences synced with the remote account.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Settings keyed by project id, or by [`DEFAULT_SETTINGS_KEY`].
    #[serde(default)]
    pub console_settings: BTreeMap<String, ConsoleSettings>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Preferences {
    /// Settings for `project_id`, falling back to the default entry.
    pub fn console_settings_for(&self, project_id: Option<&str>) -> Option<&ConsoleSettings> {
        project_id
            .and_then(|id| self.console_settings.get(id))
            .or_else(|| self.console_settings.get(DEFAULT_SETTINGS_KEY))
    }
}

/// Everything the installation knows about its user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub name: String,
    /// Transport endpoints; one is picked at random per session.
    #[serde(default)]
    pub ws_servers: Vec<String>,
    /// Declaration order matters for project resolution.
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl UserData {
    pub fn console_settings_for(&self, project_id: Option<&str>) -> Option<&ConsoleSettings> {
        self.preferences.console_settings_for(project_id)
    }

    /// Every project domain, in declaration order.
    pub fn all_domains(&self) -> Vec<String> {
        self.projects
            .iter()
            .flat_map(|p| p.a_domains.iter().cloned())
            .collect()
    }

    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_data() -> UserData {
        serde_json::from_value(json!({
            "token": "tok-123",
            "name": "Ada",
            "wsServers": ["wss://a.example", "wss://b.example"],
            "projects": [
                { "id": "p1", "name": "Shop", "a_domains": ["shop.test", "api.shop.test"] },
                { "id": "p2", "name": "Blog", "a_domains": ["blog.test"] }
            ],
            "preferences": {
                "theme": "dark",
                "consoleSettings": {
                    "default": { "sendConsole": true, "sendConsoleTabs": ["l", "e"] },
                    "p2": {
                        "sendConsole": true,
                        "sendConsoleTabs": ["w"],
                        "hiddenDomains": " cdn.test , ads.test",
                        "hiddenFiles": "Noise.php",
                        "showTimestamps": true
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_settings_fall_back_to_default() {
        let data = user_data();
        let p1 = data.console_settings_for(Some("p1")).unwrap();
        assert!(p1.allows(&MessageType::Error));
        assert!(!p1.allows(&MessageType::Warning));

        let none = data.console_settings_for(None).unwrap();
        assert_eq!(none, p1);

        let p2 = data.console_settings_for(Some("p2")).unwrap();
        assert!(p2.allows(&MessageType::Warning));
        assert!(!p2.allows(&MessageType::Log));
    }

    #[test]
    fn test_missing_default_yields_none() {
        let data = UserData::default();
        assert!(data.console_settings_for(Some("p1")).is_none());
    }

    #[test]
    fn test_send_console_off_blocks_everything() {
        let settings = ConsoleSettings {
            send_console: false,
            send_console_tabs: vec![MessageType::Log],
            ..Default::default()
        };
        assert!(!settings.allows(&MessageType::Log));
    }

    #[test]
    fn test_hidden_lists_are_trimmed_exact_matches() {
        let data = user_data();
        let p2 = data.console_settings_for(Some("p2")).unwrap();
        assert!(p2.hides_domain("cdn.test"));
        assert!(p2.hides_domain("ads.test"));
        assert!(!p2.hides_domain("cdn"));
        assert!(!p2.hides_domain(""));
        assert!(p2.hides_file("Noise.php"));
        assert!(!p2.hides_url("/anything"));
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let data = user_data();
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["preferences"]["theme"], "dark");
        assert_eq!(
            value["preferences"]["consoleSettings"]["p2"]["showTimestamps"],
            true
        );
        assert_eq!(value["wsServers"][1], "wss://b.example");
    }

    #[test]
    fn test_flags_accept_loose_truthy_values() {
        let data: UserData = serde_json::from_value(json!({
            "preferences": {
                "consoleSettings": {
                    "default": {
                        "sendConsole": 1,
                        "sendConsoleTabs": ["l"],
                        "hideConsoleUrl": "1",
                        "hideConsoleFile": 0,
                        "hideConsoleDomain": ""
                    }
                }
            }
        }))
        .unwrap();

        let settings = data.console_settings_for(None).unwrap();
        assert!(settings.allows(&MessageType::Log));
        assert!(settings.hide_console_url);
        assert!(!settings.hide_console_file);
        assert!(!settings.hide_console_domain);
        assert!(!settings.hide_console_icon);
    }

    #[test]
    fn test_all_domains_keeps_declaration_order() {
        let data = user_data();
        assert_eq!(
            data.all_domains(),
            vec!["shop.test", "api.shop.test", "blog.test"]
        );
    }
}
