//! Renderer front-end.
//!
//! The devtools-panel side of one inspected page. It asks the coordinator
//! for its project once, then feeds every routed entry to its pipeline in
//! the order the bus delivers them.

use bcons_core::bus::{BusMessage, ContextId, MessageBus};
use bcons_core::buffer::RenderQueueEntry;
use bcons_core::console::ConsoleSink;

use crate::pipeline::{ConsolePipeline, ShowOutcome};

pub struct RendererFrontEnd<C: ConsoleSink> {
    context_id: ContextId,
    bus: MessageBus,
    pipeline: ConsolePipeline<C>,
    project_id: String,
}

impl<C: ConsoleSink> RendererFrontEnd<C> {
    pub fn new(context_id: impl Into<ContextId>, bus: MessageBus, console: C) -> Self {
        Self {
            context_id: context_id.into(),
            bus,
            pipeline: ConsolePipeline::new(console),
            project_id: String::new(),
        }
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    /// Project shown by this renderer; empty when the page has none.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn pipeline(&self) -> &ConsolePipeline<C> {
        &self.pipeline
    }

    /// Asks the coordinator which project this page belongs to. The answer
    /// arrives as `project-changed`, possibly followed by buffered entries.
    pub fn start(&self) {
        self.bus.publish(BusMessage::ProjectQuery {
            context_id: self.context_id.clone(),
        });
    }

    /// Handles one bus message. Messages for other pages are ignored.
    ///
    /// Returns the outcome of every entry shown, in order.
    pub async fn handle(&mut self, message: BusMessage) -> Vec<ShowOutcome> {
        if message.context_id() != Some(self.context_id.as_str()) {
            return Vec::new();
        }

        match message {
            BusMessage::ProjectChanged(ctx) => {
                let project_id = ctx.project_id().to_string();
                if project_id != self.project_id {
                    tracing::debug!(context = %self.context_id, project = %project_id, "renderer project changed");
                }
                self.project_id = project_id;
                Vec::new()
            }
            BusMessage::AppMessage { entry, .. } => vec![self.show(entry).await],
            BusMessage::BufferedMessages { entries, .. } => {
                tracing::debug!(count = entries.len(), "renderer received buffered messages");
                let mut outcomes = Vec::with_capacity(entries.len());
                for entry in entries {
                    outcomes.push(self.show(entry).await);
                }
                outcomes
            }
            BusMessage::ProjectQuery { .. }
            | BusMessage::PageNavigated { .. }
            | BusMessage::PreferencesChanged { .. } => Vec::new(),
        }
    }

    async fn show(&mut self, entry: RenderQueueEntry) -> ShowOutcome {
        let RenderQueueEntry {
            message,
            console_settings,
            decrypt_key,
        } = entry;
        self.pipeline
            .show(message, console_settings.as_ref(), decrypt_key.as_deref())
            .await
    }
}
