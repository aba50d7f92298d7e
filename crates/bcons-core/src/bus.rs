//! Cross-context message bus.
//!
//! Contexts share no memory; everything they exchange is a [`BusMessage`].
//! The kind strings in the serialized envelope (`{ "kind", "data" }`) are a
//! protocol contract and must not change between releases.
//!
//! Delivery is broadcast, fire-and-forget and at-most-once. Messages on the
//! bus stay in publish order for every subscriber.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::buffer::RenderQueueEntry;
use crate::project::Project;
use crate::user::{Preferences, UserData};

/// Identifies the inspected page session a context belongs to.
pub type ContextId = String;

/// The resolved project of an inspected page, broadcast after every
/// navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    pub context_id: ContextId,
    pub project: Option<Project>,
    pub user_data: Option<UserData>,
}

impl ProjectContext {
    /// Project id, or the empty string meaning "no project".
    pub fn project_id(&self) -> &str {
        self.project.as_ref().map(|p| p.id.as_str()).unwrap_or("")
    }
}

/// The closed set of messages exchanged between contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "kebab-case")]
pub enum BusMessage {
    /// A renderer asks which project its page belongs to.
    #[serde(rename_all = "camelCase")]
    ProjectQuery { context_id: ContextId },
    /// Answer to a query, and broadcast after every re-resolution.
    ProjectChanged(ProjectContext),
    /// Console settings were edited; carries the full preferences.
    #[serde(rename_all = "camelCase")]
    PreferencesChanged {
        preferences: Preferences,
        token: String,
    },
    /// The inspected page navigated to a new URL.
    #[serde(rename_all = "camelCase")]
    PageNavigated { context_id: ContextId, url: String },
    /// Entries buffered before the renderer was ready, in arrival order.
    #[serde(rename_all = "camelCase")]
    BufferedMessages {
        context_id: ContextId,
        entries: Vec<RenderQueueEntry>,
    },
    /// One live message for the renderer.
    #[serde(rename_all = "camelCase")]
    AppMessage {
        context_id: ContextId,
        entry: RenderQueueEntry,
    },
}

impl BusMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProjectQuery { .. } => "project-query",
            Self::ProjectChanged(_) => "project-changed",
            Self::PreferencesChanged { .. } => "preferences-changed",
            Self::PageNavigated { .. } => "page-navigated",
            Self::BufferedMessages { .. } => "buffered-messages",
            Self::AppMessage { .. } => "app-message",
        }
    }

    /// The page session this message is addressed to, if it is scoped.
    pub fn context_id(&self) -> Option<&str> {
        match self {
            Self::ProjectQuery { context_id }
            | Self::PageNavigated { context_id, .. }
            | Self::BufferedMessages { context_id, .. }
            | Self::AppMessage { context_id, .. } => Some(context_id),
            Self::ProjectChanged(ctx) => Some(&ctx.context_id),
            Self::PreferencesChanged { .. } => None,
        }
    }
}

/// Publishing half of the bus; cheap to clone into every context.
#[derive(Clone)]
pub struct MessageBus {
    sender: broadcast::Sender<BusMessage>,
}

impl MessageBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes without waiting for, or requiring, any receiver.
    pub fn publish(&self, message: BusMessage) {
        let kind = message.kind();
        match self.sender.send(message) {
            Ok(receivers) => tracing::debug!(kind, receivers, "bus publish"),
            Err(_) => tracing::debug!(kind, "bus publish with no receivers"),
        }
    }

    pub fn subscribe(&self) -> BusReceiver {
        BusReceiver {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Receiving half held by a single context.
pub struct BusReceiver {
    receiver: broadcast::Receiver<BusMessage>,
}

impl BusReceiver {
    /// Waits for the next message; `None` once every publisher is gone.
    ///
    /// A receiver that fell behind loses the overflowed messages (logged)
    /// and continues with the oldest one still retained.
    pub async fn recv(&mut self) -> Option<BusMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "bus receiver lagged, messages lost");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next message if one is already queued.
    pub fn try_recv(&mut self) -> Option<BusMessage> {
        loop {
            match self.receiver.try_recv() {
                Ok(message) => return Some(message),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "bus receiver lagged, messages lost");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drains everything currently queued.
    pub fn drain(&mut self) -> Vec<BusMessage> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
