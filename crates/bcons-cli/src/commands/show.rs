use std::path::Path;

use anyhow::{Context, Result};
use bcons_application::{ConsolePipeline, ShowOutcome};
use bcons_core::message::WireMessage;
use bcons_core::secret::SecretStore;
use bcons_infrastructure::TerminalConsole;

use super::AppContext;

pub async fn run(ctx: &AppContext, file: &Path) -> Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let message = WireMessage::from_json(&text)?;

    let user_data = ctx.user_data().await?;
    let settings = user_data.console_settings_for(Some(&message.p));
    let key = if message.encrypted {
        ctx.secrets().get_decrypt_key(&message.p).await?
    } else {
        None
    };

    let mut pipeline = ConsolePipeline::new(TerminalConsole::stdout());
    match pipeline.show(message, settings, key.as_deref()).await {
        ShowOutcome::Rendered | ShowOutcome::GroupEnded => {}
        ShowOutcome::Disabled => eprintln!("not shown: message type disabled by console settings"),
        ShowOutcome::Hidden => eprintln!("not shown: matched a hidden domain, URL or file"),
        ShowOutcome::Dropped(reason) => eprintln!("dropped: {reason:?}"),
    }
    Ok(())
}
