//! Per-page coordinator.
//!
//! One coordinator runs for every inspected page. It owns the page's project
//! resolution and transport session, buffers messages until a renderer is
//! ready, and answers project queries. It is driven by a single task, so its
//! state needs no locking.

use std::sync::Arc;

use bcons_core::buffer::{MessageBuffer, RenderQueueEntry};
use bcons_core::bus::{BusMessage, ContextId, MessageBus, ProjectContext};
use bcons_core::error::{BconsError, Result};
use bcons_core::message::WireMessage;
use bcons_core::project::{self, Project};
use bcons_core::secret::SecretStore;
use bcons_core::transport::{
    BROWSER_EXTENSION_DEVICE, Transport, TransportParams, TransportPayload,
};
use bcons_core::user::{Preferences, UserData, UserDataRepository};

/// Where a routed message went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// Published to the ready renderer.
    Delivered,
    /// Held until a renderer is ready.
    Buffered,
}

pub struct Coordinator {
    context_id: ContextId,
    device: String,
    user_data: Option<UserData>,
    project: Option<Project>,
    /// Project id of the open transport session.
    session: Option<String>,
    buffer: MessageBuffer,
    renderer_ready: bool,
    repository: Arc<dyn UserDataRepository>,
    secrets: Arc<dyn SecretStore>,
    transport: Arc<dyn Transport>,
    bus: MessageBus,
}

impl Coordinator {
    pub fn new(
        context_id: impl Into<ContextId>,
        bus: MessageBus,
        repository: Arc<dyn UserDataRepository>,
        secrets: Arc<dyn SecretStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            context_id: context_id.into(),
            device: BROWSER_EXTENSION_DEVICE.to_string(),
            user_data: None,
            project: None,
            session: None,
            buffer: MessageBuffer::new(),
            renderer_ready: false,
            repository,
            secrets,
            transport,
            bus,
        }
    }

    /// Device tag announced when connecting.
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn user_data(&self) -> Option<&UserData> {
        self.user_data.as_ref()
    }

    pub fn is_renderer_ready(&self) -> bool {
        self.renderer_ready
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn project_context(&self) -> ProjectContext {
        ProjectContext {
            context_id: self.context_id.clone(),
            project: self.project.clone(),
            user_data: self.user_data.clone(),
        }
    }

    /// Re-resolves the project after the inspected page navigated to `url`.
    ///
    /// Always ends by broadcasting `project-changed`, even when nothing
    /// matched. Collaborator failures are logged and leave the page without
    /// a session; they never fail the navigation.
    pub async fn on_navigation(&mut self, url: &str) {
        self.notify_page_reload().await;
        self.reload_user_data().await;

        let next = self
            .user_data
            .as_ref()
            .and_then(|data| project::resolve(url, &data.projects))
            .cloned();

        match &next {
            Some(p) => tracing::debug!(context = %self.context_id, url, project = %p.id, "page resolved"),
            None => tracing::debug!(context = %self.context_id, url, "page has no project"),
        }

        let keep_session = matches!(
            (&self.session, &next),
            (Some(open), Some(p)) if *open == p.id
        );
        if !keep_session {
            self.close_session().await;
            if let Some(p) = &next {
                self.open_session(p).await;
            }
        }

        self.project = next;
        self.bus
            .publish(BusMessage::ProjectChanged(self.project_context()));
    }

    /// Lets other consoles of the active project know the page changed.
    async fn notify_page_reload(&self) {
        let (Some(project_id), Some(data)) = (&self.session, &self.user_data) else {
            return;
        };
        let payload = TransportPayload::PageReload {
            user_token: data.token.clone(),
            p: project_id.clone(),
        };
        if let Err(e) = self.transport.send(payload).await {
            tracing::warn!(project = %project_id, "failed to send page reload: {}", e);
        }
    }

    async fn reload_user_data(&mut self) {
        match self.repository.get().await {
            Ok(Some(data)) => self.user_data = Some(data),
            Ok(None) => {
                let e = BconsError::configuration("no user data stored");
                tracing::warn!("{}", e);
                self.user_data = None;
            }
            Err(e) => tracing::error!("failed to load user data, keeping cached copy: {}", e),
        }
    }

    async fn close_session(&mut self) {
        let discarded = self.buffer.drain().len();
        if discarded > 0 {
            tracing::debug!(discarded, "dropping messages buffered for the previous project");
        }
        let Some(project_id) = self.session.take() else {
            return;
        };
        if let Err(e) = self.transport.disconnect().await {
            tracing::error!(project = %project_id, "transport disconnect failed: {}", e);
        }
    }

    async fn open_session(&mut self, project: &Project) {
        let Some(data) = &self.user_data else {
            return;
        };
        let params = match TransportParams::for_project(data, project, &self.device) {
            Ok(params) => params,
            Err(e) => {
                tracing::warn!(project = %project.id, "not connecting: {}", e);
                return;
            }
        };
        match self.transport.connect(params).await {
            Ok(()) => self.session = Some(project.id.clone()),
            Err(e) => tracing::error!(project = %project.id, "transport connect failed: {}", e),
        }
    }

    /// Routes one inbound wire message.
    ///
    /// Messages for any project other than the active one fail with
    /// [`BconsError::StaleMessage`]; callers drop those without logging.
    pub async fn on_transport_message(&mut self, message: WireMessage) -> Result<Routed> {
        let Some(project) = &self.project else {
            return Err(BconsError::stale(message.p));
        };
        if message.p != project.id {
            return Err(BconsError::stale(message.p));
        }

        let console_settings = self
            .user_data
            .as_ref()
            .and_then(|data| data.console_settings_for(Some(&project.id)))
            .cloned();
        let decrypt_key = match self.secrets.get_decrypt_key(&project.id).await {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(project = %project.id, "failed to read decrypt key: {}", e);
                None
            }
        };

        let entry = RenderQueueEntry {
            message,
            console_settings,
            decrypt_key,
        };

        if self.renderer_ready {
            self.bus.publish(BusMessage::AppMessage {
                context_id: self.context_id.clone(),
                entry,
            });
            Ok(Routed::Delivered)
        } else {
            self.buffer.push(entry);
            tracing::debug!(buffered = self.buffer.len(), "renderer not ready, message buffered");
            Ok(Routed::Buffered)
        }
    }

    /// Marks the renderer ready and hands it every buffered entry.
    ///
    /// Returns the number of entries delivered; zero on repeated calls.
    pub fn on_renderer_ready(&mut self) -> usize {
        if self.renderer_ready {
            return 0;
        }
        self.renderer_ready = true;
        self.flush_buffer()
    }

    /// Answers a renderer's project query, then hands over the buffer.
    ///
    /// Queries for other pages are ignored and return `false`.
    pub fn on_project_query(&mut self, context_id: &str) -> bool {
        if context_id != self.context_id {
            return false;
        }
        self.bus
            .publish(BusMessage::ProjectChanged(self.project_context()));
        self.flush_buffer();
        true
    }

    fn flush_buffer(&mut self) -> usize {
        let entries = self.buffer.drain();
        let count = entries.len();
        if count > 0 {
            self.bus.publish(BusMessage::BufferedMessages {
                context_id: self.context_id.clone(),
                entries,
            });
        }
        count
    }

    /// Replaces the cached preferences with ones edited elsewhere.
    pub fn on_preferences_changed(&mut self, preferences: Preferences) {
        if let Some(data) = self.user_data.as_mut() {
            data.preferences = preferences;
        }
    }

    /// Dispatches a bus message addressed to this coordinator.
    pub async fn handle_bus(&mut self, message: BusMessage) {
        match message {
            BusMessage::PageNavigated { context_id, url } if context_id == self.context_id => {
                self.on_navigation(&url).await;
            }
            BusMessage::ProjectQuery { context_id } => {
                self.on_project_query(&context_id);
            }
            BusMessage::PreferencesChanged { preferences, .. } => {
                self.on_preferences_changed(preferences);
            }
            _ => {}
        }
    }
}
