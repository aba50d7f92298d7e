use anyhow::Result;
use bcons_application::BackgroundService;

use super::AppContext;

pub async fn run(ctx: &AppContext, token: Option<String>) -> Result<()> {
    let service = BackgroundService::new(ctx.repository(), ctx.api(), ctx.net_rules());

    let user_data = match token {
        Some(token) => service.refresh_user_data(&token).await?,
        None => match service.refresh_stored().await? {
            Some(data) => data,
            None => anyhow::bail!("No stored token; pass --token <token>"),
        },
    };

    println!(
        "Fetched {} project(s), {} server(s) for {}",
        user_data.projects.len(),
        user_data.ws_servers.len(),
        if user_data.name.is_empty() { "<unnamed>" } else { &user_data.name },
    );
    Ok(())
}
