//! Decrypt/filter/render pipeline.
//!
//! Turns one wire message into at most one console emission. The gates run
//! in a fixed order and each one may end processing:
//!
//! 1. enablement (settings present, console on, type selected)
//! 2. decryption of every sealed field, all or nothing
//! 3. domain / endpoint / file block-lists
//! 4. console clear (side effect only)
//! 5. grouping
//! 6. ping label
//! 7. backtrace body
//! 8. content decoding
//! 9. badges and emission
//!
//! Grouping runs before content decoding, so a message dropped for a bad
//! body still leaves the group stack consistent.
//!
//! # Module Structure
//!
//! - `filter`: enablement and block-list gates
//! - `decrypt`: whole-message decryption
//! - `grouping`: the per-pipeline group stack
//! - `format`: content decoding and badge assembly

mod decrypt;
mod filter;
mod format;
mod grouping;

pub use decrypt::decrypt_message;
pub use format::strip_html;
pub use grouping::GroupStack;

use bcons_core::console::ConsoleSink;
use bcons_core::message::{ContentType, ExtraData, MessageType, WireMessage};
use bcons_core::user::ConsoleSettings;

/// Why a message produced no output although it was meant to be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Encrypted, but no passphrase is stored for the project.
    MissingKey,
    /// A sealed field could not be decrypted.
    Decryption,
    /// Body or extra data is not valid JSON.
    Malformed,
    /// The decryption task did not complete.
    Internal,
}

/// Result of showing one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOutcome {
    /// A log line or table was emitted.
    Rendered,
    /// The message closed a group and carried nothing else.
    GroupEnded,
    /// Console output is off for this message.
    Disabled,
    /// The message matched a block-list.
    Hidden,
    Dropped(DropReason),
}

/// Renders wire messages to a console sink.
///
/// Each pipeline owns its group stack; two pipelines never share groups.
pub struct ConsolePipeline<C: ConsoleSink> {
    console: C,
    groups: GroupStack,
}

impl<C: ConsoleSink> ConsolePipeline<C> {
    pub fn new(console: C) -> Self {
        Self {
            console,
            groups: GroupStack::new(),
        }
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn groups(&self) -> &GroupStack {
        &self.groups
    }

    /// Shows `message` if `settings` allow it.
    ///
    /// Never fails: every per-message problem is logged and reported as
    /// [`ShowOutcome::Dropped`]. Decryption runs on the blocking pool, so
    /// only this call is suspended while it runs.
    pub async fn show(
        &mut self,
        message: WireMessage,
        settings: Option<&ConsoleSettings>,
        decrypt_key: Option<&str>,
    ) -> ShowOutcome {
        let Some(settings) = filter::enabled_settings(&message, settings) else {
            return ShowOutcome::Disabled;
        };

        let message = if message.encrypted {
            let Some(passphrase) = decrypt_key.map(str::to_string) else {
                tracing::warn!(project = %message.p, "cannot show message: no decrypt passphrase");
                return ShowOutcome::Dropped(DropReason::MissingKey);
            };
            let project = message.p.clone();
            match tokio::task::spawn_blocking(move || decrypt_message(message, &passphrase)).await
            {
                Ok(Ok(decrypted)) => decrypted,
                Ok(Err(e)) => {
                    tracing::warn!(project = %project, "cannot show message: {}", e);
                    return ShowOutcome::Dropped(DropReason::Decryption);
                }
                Err(e) => {
                    tracing::error!("decryption task failed: {}", e);
                    return ShowOutcome::Dropped(DropReason::Internal);
                }
            }
        } else {
            message
        };

        let extra = match message.extra_data() {
            Ok(extra) => extra,
            Err(e) => {
                tracing::warn!("dropping message: {}", e);
                return ShowOutcome::Dropped(DropReason::Malformed);
            }
        };

        if filter::is_hidden(&message, settings) {
            return ShowOutcome::Hidden;
        }

        self.render(message, extra, settings)
    }

    fn render(
        &mut self,
        mut message: WireMessage,
        extra: ExtraData,
        settings: &ConsoleSettings,
    ) -> ShowOutcome {
        if extra.clear_console {
            self.console.clear();
        }

        if extra.group_end {
            self.groups.pop(&mut self.console);
            return ShowOutcome::GroupEnded;
        }
        match &extra.group_data {
            Some(group) => self.groups.enter(group, &mut self.console),
            None => self.groups.close_all(&mut self.console),
        }

        let ping = extra.ping_label();
        if let Some(label) = &ping {
            let label = label.trim();
            message.m = if label.is_empty() {
                format!("{} ({})", message.file_basename(), message.fl)
            } else {
                label.to_string()
            };
        }

        if extra.trace_is_msg {
            if let Some(frames) = &extra.php_bt {
                message.m = frames
                    .iter()
                    .map(|f| format!("\n{} ({})\n{}", f.file, f.line, f.code.trim()))
                    .collect::<Vec<_>>()
                    .join("\n");
                message.mt = MessageType::Trace;
            }
        }

        let content = match format::decode_content(&message) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("dropping message: {}", e);
                return ShowOutcome::Dropped(DropReason::Malformed);
            }
        };

        if message.ct == ContentType::Table {
            self.console.table(content.to_value(), extra.columns);
        } else {
            let line = format::console_line(&message, settings, ping.is_some(), content);
            self.console.log(line);
        }
        ShowOutcome::Rendered
    }
}
