//! Project domain model.

use serde::{Deserialize, Serialize};

/// A named grouping of domains sharing a routing context and console settings.
///
/// Loaded once per session and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Hostnames whose pages belong to this project.
    #[serde(default)]
    pub a_domains: Vec<String>,
}

impl Project {
    /// Membership test: exact hostname match against `a_domains`.
    pub fn owns_host(&self, host: &str) -> bool {
        self.a_domains.iter().any(|d| d == host)
    }
}
