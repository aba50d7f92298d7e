use anyhow::Result;
use bcons_core::project::{self, Project};

use super::AppContext;

pub async fn run(ctx: &AppContext, url: &str) -> Result<()> {
    let user_data = ctx.user_data().await?;
    println!("{}", describe(url, &user_data.projects));
    Ok(())
}

fn describe(url: &str, projects: &[Project]) -> String {
    let Some(host) = project::hostname(url) else {
        return format!("{url}: not a page URL");
    };
    match project::resolve(url, projects) {
        Some(p) if p.name.is_empty() => format!("{host} -> {}", p.id),
        Some(p) => format!("{host} -> {} ({})", p.id, p.name),
        None => format!("{host} -> no project"),
    }
}
