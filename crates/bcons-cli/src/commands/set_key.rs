use anyhow::{Result, bail};
use bcons_core::secret::SecretStore;

use super::AppContext;

pub async fn run(ctx: &AppContext, project: &str, passphrase: &str) -> Result<()> {
    if project.is_empty() || passphrase.is_empty() {
        bail!("project and passphrase must not be empty");
    }
    ctx.secrets().set_decrypt_key(project, passphrase).await?;
    println!("Stored decrypt passphrase for {project}");
    Ok(())
}
