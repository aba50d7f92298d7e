//! Project resolution.
//!
//! Overlapping domains resolve to the earliest-declared project. The order
//! comes straight from the persisted project list, so callers must not
//! reorder or deduplicate it.

use url::Url;

use super::Project;

/// Extracts the hostname of `url`, or `None` when it cannot be parsed or has
/// no host (e.g. `about:blank`).
pub fn hostname(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str().map(str::to_string)
}

/// Returns the first project in `projects` that owns the hostname of `url`.
///
/// Unparseable URLs resolve to `None` rather than an error.
pub fn resolve<'a>(url: &str, projects: &'a [Project]) -> Option<&'a Project> {
    let host = hostname(url)?;
    projects.iter().find(|p| p.owns_host(&host))
}
