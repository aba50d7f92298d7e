//! Application layer of the bcons relay.
//!
//! Every context is a plain state object driven by one task: the
//! [`Coordinator`] per inspected page, the [`RendererFrontEnd`] with its
//! [`ConsolePipeline`], and the installation-wide [`BackgroundService`].
//! They share nothing and talk only through the message bus.

pub mod background;
pub mod coordinator;
pub mod pipeline;
pub mod preferences;
pub mod renderer;

pub use background::{BackgroundService, NavigationWatcher};
pub use coordinator::{Coordinator, Routed};
pub use pipeline::{ConsolePipeline, DropReason, ShowOutcome};
pub use preferences::PreferencesService;
pub use renderer::RendererFrontEnd;
