//! Execution layer: runs the relay's contexts as tokio tasks and sets up
//! logging.

pub mod logging;
pub mod runtime;

pub use logging::init_logging;
pub use runtime::{RelayOptions, RelayRuntime, RelayServices};
