use anyhow::Result;
use bcons_application::BackgroundService;
use bcons_core::secret::SecretStore;

use super::AppContext;

pub async fn run(ctx: &AppContext) -> Result<()> {
    let user_data = ctx.user_data().await?;
    let service = BackgroundService::new(ctx.repository(), ctx.api(), ctx.net_rules());
    let secrets = ctx.secrets();

    println!("data dir: {}", ctx.paths.data_dir().display());
    println!("user:     {}", user_data.name);
    println!(
        "token:    {}",
        service.token_hint().await?.unwrap_or_else(|| "<none>".to_string())
    );
    println!("servers:  {}", user_data.ws_servers.len());
    println!("projects:");
    for project in &user_data.projects {
        let key = if secrets.get_decrypt_key(&project.id).await?.is_some() {
            "key stored"
        } else {
            "no key"
        };
        println!(
            "  {} {} [{}] ({key})",
            project.id,
            project.name,
            project.a_domains.join(", ")
        );
    }
    Ok(())
}
