//! User domain module.
//!
//! # Module Structure
//!
//! - `model`: UserData, Preferences and ConsoleSettings
//! - `repository`: persistence collaborator trait

mod model;
mod repository;

pub use model::{ConsoleSettings, DEFAULT_SETTINGS_KEY, Preferences, UserData};
pub use repository::UserDataRepository;
