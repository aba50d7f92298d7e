//! Multi-task relay runtime.
//!
//! Runs the background service, one page coordinator and its renderer as
//! independent tokio tasks. They share only the message bus; the coordinator
//! additionally owns the inbound transport channel and the panel-shown
//! signal.

use std::sync::Arc;
use std::time::Duration;

use bcons_application::{BackgroundService, Coordinator, NavigationWatcher, RendererFrontEnd};
use bcons_core::api::UserDataApi;
use bcons_core::bus::{BusMessage, BusReceiver, ContextId, MessageBus, ProjectContext};
use bcons_core::config::RelayConfig;
use bcons_core::console::ConsoleSink;
use bcons_core::message::WireMessage;
use bcons_core::net_rules::NetRuleService;
use bcons_core::secret::SecretStore;
use bcons_core::transport::Transport;
use bcons_core::user::UserDataRepository;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Collaborators shared by the relay's contexts.
#[derive(Clone)]
pub struct RelayServices {
    pub repository: Arc<dyn UserDataRepository>,
    pub secrets: Arc<dyn SecretStore>,
    pub transport: Arc<dyn Transport>,
    pub api: Arc<dyn UserDataApi>,
    pub net_rules: Arc<dyn NetRuleService>,
}

#[derive(Debug, Clone)]
pub struct RelayOptions {
    pub context_id: ContextId,
    pub device: String,
    pub bus_capacity: usize,
    /// How long `navigate` waits for the coordinator's answer.
    pub navigation_timeout: Duration,
}

impl RelayOptions {
    pub fn from_config(config: &RelayConfig, context_id: impl Into<ContextId>) -> Self {
        Self {
            context_id: context_id.into(),
            device: config.device.clone(),
            bus_capacity: config.bus_capacity,
            navigation_timeout: Duration::from_secs(5),
        }
    }
}

struct Stage {
    name: &'static str,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Stage {
    /// Cancels the task and waits until it has drained its inputs.
    async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            tracing::error!(stage = self.name, "task ended abnormally: {}", e);
        }
    }
}

/// Handle to a running relay.
pub struct RelayRuntime {
    context_id: ContextId,
    bus: MessageBus,
    navigation: mpsc::UnboundedSender<(ContextId, String)>,
    panel_shown: mpsc::UnboundedSender<()>,
    navigation_timeout: Duration,
    background: Stage,
    coordinator: Stage,
    renderer: Stage,
}

impl RelayRuntime {
    /// Spawns every context and waits for the renderer's project handshake.
    ///
    /// `inbound` is the receiving end of the channel the transport delivers
    /// wire messages into.
    pub async fn start<C>(
        services: RelayServices,
        inbound: mpsc::UnboundedReceiver<WireMessage>,
        console: C,
        options: RelayOptions,
    ) -> Self
    where
        C: ConsoleSink + 'static,
    {
        let bus = MessageBus::new(options.bus_capacity);
        let mut handshake = bus.subscribe();
        let (navigation, navigation_rx) = mpsc::unbounded_channel();
        let (panel_shown, panel_rx) = mpsc::unbounded_channel();

        let background = {
            let service = BackgroundService::new(
                services.repository.clone(),
                services.api.clone(),
                services.net_rules.clone(),
            );
            let cancel = CancellationToken::new();
            let task = run_background(service, bus.clone(), bus.subscribe(), navigation_rx, cancel.clone());
            Stage {
                name: "background",
                cancel,
                handle: tokio::spawn(task),
            }
        };

        let coordinator = {
            let coordinator = Coordinator::new(
                options.context_id.clone(),
                bus.clone(),
                services.repository.clone(),
                services.secrets.clone(),
                services.transport.clone(),
            )
            .with_device(options.device.clone());
            let cancel = CancellationToken::new();
            let task = run_coordinator(coordinator, bus.subscribe(), inbound, panel_rx, cancel.clone());
            Stage {
                name: "coordinator",
                cancel,
                handle: tokio::spawn(task),
            }
        };

        let renderer = {
            let renderer = RendererFrontEnd::new(options.context_id.clone(), bus.clone(), console);
            let cancel = CancellationToken::new();
            let task = run_renderer(renderer, bus.subscribe(), cancel.clone());
            Stage {
                name: "renderer",
                cancel,
                handle: tokio::spawn(task),
            }
        };

        let context_id = options.context_id.clone();
        if wait_for_project(&mut handshake, &context_id, HANDSHAKE_TIMEOUT)
            .await
            .is_none()
        {
            tracing::warn!(context = %context_id, "renderer handshake timed out");
        }
        tracing::info!(context = %context_id, "relay started");

        Self {
            context_id,
            bus,
            navigation,
            panel_shown,
            navigation_timeout: options.navigation_timeout,
            background,
            coordinator,
            renderer,
        }
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Reports a navigation of the inspected page and waits for the
    /// resulting project.
    ///
    /// Returns `None` when the URL is unchanged (no re-resolution happens)
    /// or the coordinator did not answer in time.
    pub async fn navigate(&self, url: &str) -> Option<ProjectContext> {
        let mut rx = self.bus.subscribe();
        if self
            .navigation
            .send((self.context_id.clone(), url.to_string()))
            .is_err()
        {
            return None;
        }
        wait_for_project(&mut rx, &self.context_id, self.navigation_timeout).await
    }

    /// The devtools panel became visible; buffered messages flow to it.
    pub fn panel_shown(&self) {
        if self.panel_shown.send(()).is_err() {
            tracing::warn!("coordinator is gone, panel-shown ignored");
        }
    }

    /// Stops every context in pipeline order, letting each one finish what
    /// is already queued for it.
    pub async fn shutdown(self) {
        self.background.stop().await;
        self.coordinator.stop().await;
        self.renderer.stop().await;
        tracing::info!(context = %self.context_id, "relay stopped");
    }
}

async fn wait_for_project(
    rx: &mut BusReceiver,
    context_id: &str,
    timeout: Duration,
) -> Option<ProjectContext> {
    let wait = async {
        while let Some(message) = rx.recv().await {
            if let BusMessage::ProjectChanged(ctx) = message {
                if ctx.context_id == context_id {
                    return Some(ctx);
                }
            }
        }
        None
    };
    tokio::time::timeout(timeout, wait).await.ok().flatten()
}

async fn run_background(
    service: BackgroundService,
    bus: MessageBus,
    mut bus_rx: BusReceiver,
    mut navigation: mpsc::UnboundedReceiver<(ContextId, String)>,
    cancel: CancellationToken,
) {
    let mut watcher = NavigationWatcher::new();
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            Some((context_id, url)) = navigation.recv() => {
                if let Some(message) = watcher.observe(&context_id, &url) {
                    bus.publish(message);
                }
            }
            Some(message) = bus_rx.recv() => service.handle_bus(message).await,
            else => break,
        }
    }

    while let Ok((context_id, url)) = navigation.try_recv() {
        if let Some(message) = watcher.observe(&context_id, &url) {
            bus.publish(message);
        }
    }
    for message in bus_rx.drain() {
        service.handle_bus(message).await;
    }
}

async fn route(coordinator: &mut Coordinator, message: WireMessage) {
    if let Err(e) = coordinator.on_transport_message(message).await {
        if !e.is_stale() {
            tracing::warn!("failed to route message: {}", e);
        }
    }
}

async fn run_coordinator(
    mut coordinator: Coordinator,
    mut bus_rx: BusReceiver,
    mut inbound: mpsc::UnboundedReceiver<WireMessage>,
    mut panel_shown: mpsc::UnboundedReceiver<()>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            Some(message) = bus_rx.recv() => coordinator.handle_bus(message).await,
            Some(()) = panel_shown.recv() => {
                let delivered = coordinator.on_renderer_ready();
                tracing::debug!(delivered, "renderer ready");
            }
            Some(message) = inbound.recv() => route(&mut coordinator, message).await,
            else => break,
        }
    }

    for message in bus_rx.drain() {
        coordinator.handle_bus(message).await;
    }
    while panel_shown.try_recv().is_ok() {
        coordinator.on_renderer_ready();
    }
    while let Ok(message) = inbound.try_recv() {
        route(&mut coordinator, message).await;
    }
}

async fn run_renderer<C: ConsoleSink + 'static>(
    mut renderer: RendererFrontEnd<C>,
    mut bus_rx: BusReceiver,
    cancel: CancellationToken,
) {
    renderer.start();
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            Some(message) = bus_rx.recv() => {
                renderer.handle(message).await;
            }
            else => break,
        }
    }

    for message in bus_rx.drain() {
        renderer.handle(message).await;
    }
}
