//! Domain layer of the bcons relay.
//!
//! Holds the data model shared by every context, the pure project resolver,
//! the pending-message buffer, payload crypto, and the traits through which
//! the application layer talks to its collaborators.

pub mod api;
pub mod buffer;
pub mod bus;
pub mod config;
pub mod console;
pub mod crypto;
pub mod error;
pub mod message;
pub mod net_rules;
pub mod project;
pub mod secret;
pub mod transport;
pub mod user;

pub use buffer::{MessageBuffer, RenderQueueEntry};
pub use bus::{BusMessage, BusReceiver, ContextId, MessageBus, ProjectContext};
pub use error::{BconsError, Result};
pub use message::WireMessage;
pub use project::Project;
pub use user::{ConsoleSettings, Preferences, UserData};
