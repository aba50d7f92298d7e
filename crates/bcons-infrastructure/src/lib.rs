//! Infrastructure layer: file-backed stores, the account API client, the
//! loopback transport and terminal rendering.

pub mod api_client;
pub mod config_service;
pub mod loopback_transport;
pub mod net_rule_store;
pub mod paths;
pub mod secret_store;
pub mod storage;
pub mod terminal_console;
pub mod user_data_repository;

pub use crate::api_client::HttpUserDataApi;
pub use crate::config_service::ConfigService;
pub use crate::loopback_transport::{LoopbackTransport, TransportEvent};
pub use crate::net_rule_store::{FileNetRuleStore, RecordingNetRules};
pub use crate::paths::BconsPaths;
pub use crate::secret_store::{FileSecretStore, InMemorySecretStore};
pub use crate::terminal_console::TerminalConsole;
pub use crate::user_data_repository::{InMemoryUserDataRepository, JsonUserDataRepository};
