//! Declarative request-header rule.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::user::UserData;

/// Header carrying the user token on requests to project domains.
pub const USER_HEADER: &str = "Bcons-User";

/// A single "set request header" rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderRule {
    pub id: u32,
    pub header: String,
    pub value: String,
    pub operation: String,
    pub request_domains: Vec<String>,
    pub resource_types: Vec<String>,
}

impl HeaderRule {
    /// The one rule covering every domain of every project.
    pub fn for_user(user_data: &UserData) -> Self {
        Self {
            id: 1,
            header: USER_HEADER.to_string(),
            value: user_data.token.clone(),
            operation: "set".to_string(),
            request_domains: user_data.all_domains(),
            resource_types: vec!["main_frame".to_string(), "xmlhttprequest".to_string()],
        }
    }
}

/// Installs header rules. Installing replaces every existing rule.
#[async_trait]
pub trait NetRuleService: Send + Sync {
    async fn install(&self, rule: HeaderRule) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Project;

    #[test]
    fn test_rule_covers_union_of_domains() {
        let data = UserData {
            token: "tok".into(),
            projects: vec![
                Project {
                    id: "a".into(),
                    name: "A".into(),
                    a_domains: vec!["a.com".into()],
                },
                Project {
                    id: "b".into(),
                    name: "B".into(),
                    a_domains: vec!["b.com".into(), "c.com".into()],
                },
            ],
            ..Default::default()
        };
        let rule = HeaderRule::for_user(&data);
        assert_eq!(rule.id, 1);
        assert_eq!(rule.header, "Bcons-User");
        assert_eq!(rule.value, "tok");
        assert_eq!(rule.request_domains, vec!["a.com", "b.com", "c.com"]);
        assert_eq!(rule.resource_types, vec!["main_frame", "xmlhttprequest"]);
    }
}
