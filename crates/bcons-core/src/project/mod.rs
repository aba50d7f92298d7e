//! Project domain module.
//!
//! # Module Structure
//!
//! - `model`: Project domain model
//! - `resolver`: maps an inspected page URL to at most one project

mod model;
mod resolver;

pub use model::Project;
pub use resolver::{hostname, resolve};
