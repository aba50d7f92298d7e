//! In-process transport.
//!
//! Stands in for the remote connection: inbound wire messages are injected
//! by the caller and only delivered while a session is open, like a real
//! socket would.

use std::sync::{Arc, Mutex};

use bcons_core::error::{BconsError, Result};
use bcons_core::message::WireMessage;
use bcons_core::transport::{Transport, TransportParams, TransportPayload};
use tokio::sync::mpsc;

/// Something the coordinator asked the transport to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected(TransportParams),
    Disconnected,
    Sent(TransportPayload),
}

#[derive(Debug, Default)]
struct LoopbackState {
    session: Option<TransportParams>,
    events: Vec<TransportEvent>,
}

#[derive(Clone)]
pub struct LoopbackTransport {
    inbound: mpsc::UnboundedSender<WireMessage>,
    state: Arc<Mutex<LoopbackState>>,
}

impl LoopbackTransport {
    /// Creates the transport and the receiver the runtime reads inbound
    /// messages from.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WireMessage>) {
        let (inbound, receiver) = mpsc::unbounded_channel();
        let transport = Self {
            inbound,
            state: Arc::new(Mutex::new(LoopbackState::default())),
        };
        (transport, receiver)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut LoopbackState) -> T) -> Result<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| BconsError::internal("loopback transport state poisoned"))?;
        Ok(f(&mut state))
    }

    /// Delivers `message` as if it arrived from the server.
    ///
    /// Returns `false` when no session is open and the message was dropped.
    pub fn inject(&self, message: WireMessage) -> Result<bool> {
        if self.session()?.is_none() {
            tracing::debug!("loopback: no open session, inbound message dropped");
            return Ok(false);
        }
        self.inbound
            .send(message)
            .map_err(|_| BconsError::transport("inbound receiver closed"))?;
        Ok(true)
    }

    /// Parses and delivers a raw JSON frame.
    pub fn inject_raw(&self, frame: &str) -> Result<bool> {
        let message = WireMessage::from_json(frame)?;
        self.inject(message)
    }

    pub fn session(&self) -> Result<Option<TransportParams>> {
        self.with_state(|s| s.session.clone())
    }

    pub fn events(&self) -> Vec<TransportEvent> {
        self.with_state(|s| s.events.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Transport for LoopbackTransport {
    async fn connect(&self, params: TransportParams) -> Result<()> {
        self.with_state(|s| {
            if let Some(open) = &s.session {
                return Err(BconsError::transport(format!(
                    "session for project '{}' still open",
                    open.project_id
                )));
            }
            tracing::info!(server = %params.server, project = %params.project_id, "loopback: connected");
            s.session = Some(params.clone());
            s.events.push(TransportEvent::Connected(params));
            Ok(())
        })?
    }

    async fn disconnect(&self) -> Result<()> {
        self.with_state(|s| {
            if s.session.take().is_some() {
                tracing::info!("loopback: disconnected");
            }
            s.events.push(TransportEvent::Disconnected);
        })
    }

    async fn send(&self, payload: TransportPayload) -> Result<()> {
        self.with_state(|s| {
            if s.session.is_none() {
                return Err(BconsError::transport("send without an open session"));
            }
            tracing::debug!(?payload, "loopback: send");
            s.events.push(TransportEvent::Sent(payload));
            Ok(())
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(project: &str) -> TransportParams {
        TransportParams {
            user_token: "tok".into(),
            server: "wss://a".into(),
            device: "BE".into(),
            project_id: project.into(),
        }
    }

    #[tokio::test]
    async fn test_inbound_only_while_connected() {
        let (transport, mut rx) = LoopbackTransport::new();
        let msg = WireMessage {
            p: "p1".into(),
            ..Default::default()
        };

        assert!(!transport.inject(msg.clone()).unwrap());

        transport.connect(params("p1")).await.unwrap();
        assert!(transport.inject(msg.clone()).unwrap());
        assert_eq!(rx.recv().await.unwrap(), msg);

        transport.disconnect().await.unwrap();
        assert!(!transport.inject(msg).unwrap());
    }

    #[tokio::test]
    async fn test_double_connect_is_rejected() {
        let (transport, _rx) = LoopbackTransport::new();
        transport.connect(params("p1")).await.unwrap();
        let err = transport.connect(params("p2")).await.unwrap_err();
        assert!(matches!(err, BconsError::Transport(_)));
    }

    #[tokio::test]
    async fn test_send_requires_session() {
        let (transport, _rx) = LoopbackTransport::new();
        let payload = TransportPayload::PageReload {
            user_token: "tok".into(),
            p: "p1".into(),
        };
        assert!(transport.send(payload.clone()).await.is_err());

        transport.connect(params("p1")).await.unwrap();
        transport.send(payload.clone()).await.unwrap();
        assert_eq!(
            transport.events(),
            vec![
                TransportEvent::Connected(params("p1")),
                TransportEvent::Sent(payload)
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_raw_frame() {
        let (transport, _rx) = LoopbackTransport::new();
        transport.connect(params("p1")).await.unwrap();
        assert!(transport.inject_raw("{ not json").unwrap_err().is_malformed());
    }
}
