//! Replays a recorded devtools session through the full relay runtime.
//!
//! The input is JSON Lines, one event per line:
//!
//! ```text
//! {"event":"navigate","url":"https://shop.test/cart"}
//! {"event":"message","data":{"mt":"l","m":"hello","p":"proj1"}}
//! {"event":"panel-shown"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use bcons_core::message::WireMessage;
use bcons_execution::{RelayOptions, RelayRuntime, RelayServices};
use bcons_infrastructure::{LoopbackTransport, TerminalConsole};
use serde::Deserialize;

use super::AppContext;

const REPLAY_CONTEXT: &str = "replay";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
enum ReplayEvent {
    Navigate { url: String },
    PanelShown,
    Message { data: WireMessage },
}

fn parse_events(text: &str) -> Result<Vec<ReplayEvent>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("line {}: invalid replay event", i + 1))
        })
        .collect()
}

pub async fn run(ctx: &AppContext, file: &Path, timestamps: bool) -> Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let events = parse_events(&text)?;

    let (transport, inbound) = LoopbackTransport::new();
    let services = RelayServices {
        repository: ctx.repository(),
        secrets: ctx.secrets(),
        transport: Arc::new(transport.clone()),
        api: ctx.api(),
        net_rules: ctx.net_rules(),
    };
    let console = TerminalConsole::stdout().with_timestamps(timestamps);
    let options = RelayOptions::from_config(&ctx.config, REPLAY_CONTEXT);
    let runtime = RelayRuntime::start(services, inbound, console, options).await;

    let mut dropped = 0usize;
    for event in events {
        match event {
            ReplayEvent::Navigate { url } => match runtime.navigate(&url).await {
                Some(project) if project.project_id().is_empty() => {
                    tracing::info!(%url, "navigated outside every project")
                }
                Some(project) => tracing::info!(%url, project = project.project_id(), "navigated"),
                None => tracing::debug!(%url, "navigation did not change the project"),
            },
            ReplayEvent::PanelShown => runtime.panel_shown(),
            ReplayEvent::Message { data } => {
                if !transport.inject(data)? {
                    dropped += 1;
                }
            }
        }
    }

    runtime.shutdown().await;
    if dropped > 0 {
        tracing::warn!(dropped, "messages arrived while no session was open");
    }
    Ok(())
}
