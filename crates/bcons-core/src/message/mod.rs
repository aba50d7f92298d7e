//! Wire message domain module.
//!
//! A wire message is the unit the remote source sends for one log/debug
//! event. Fields are kept as loosely typed as the remote side produces them
//! (numbers where strings are expected, `0|1` flags, extra data that is
//! either an object or a sealed string).
//!
//! # Module Structure
//!
//! - `model`: `WireMessage` and its extra-data payload
//! - `lenient`: serde helpers for the loose wire encoding

pub(crate) mod lenient;
mod model;

pub use model::{BacktraceFrame, ContentType, Extra, ExtraData, GroupData, MessageType, WireMessage};
