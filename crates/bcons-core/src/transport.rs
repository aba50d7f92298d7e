//! Transport collaborator boundary.
//!
//! The transport owns the live connection to the remote message source,
//! including any retry policy. Inbound wire messages are not returned from
//! these methods: implementations push them into the channel the runtime
//! hands them at construction, one message per inbound frame.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::error::{BconsError, Result};
use crate::project::Project;
use crate::user::UserData;

/// Device tag sent by the browser extension.
pub const BROWSER_EXTENSION_DEVICE: &str = "BE";

/// Parameters of one transport session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportParams {
    pub user_token: String,
    pub server: String,
    pub device: String,
    pub project_id: String,
}

impl TransportParams {
    /// Builds session parameters for `project`, picking a random server.
    pub fn for_project(user_data: &UserData, project: &Project, device: &str) -> Result<Self> {
        if user_data.token.is_empty() {
            return Err(BconsError::configuration("user data has no token"));
        }
        let server = user_data
            .ws_servers
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| BconsError::configuration("user data has no transport servers"))?;

        Ok(Self {
            user_token: user_data.token.clone(),
            server: server.clone(),
            device: device.to_string(),
            project_id: project.id.clone(),
        })
    }
}

/// Outbound payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "e", rename_all = "camelCase")]
pub enum TransportPayload {
    /// Lets other consoles of the same project react to a page change.
    PageReload {
        #[serde(rename = "userToken")]
        user_token: String,
        p: String,
    },
}

/// A single logical connection to the remote message source.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens a session. Any previous session must be closed first.
    async fn connect(&self, params: TransportParams) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;

    async fn send(&self, payload: TransportPayload) -> Result<()>;
}
