//! Pending render messages.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::message::WireMessage;
use crate::user::ConsoleSettings;

/// A wire message packaged with everything the renderer needs to show it.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderQueueEntry {
    pub message: WireMessage,
    pub console_settings: Option<ConsoleSettings>,
    pub decrypt_key: Option<String>,
}

impl std::fmt::Debug for RenderQueueEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderQueueEntry")
            .field("message", &self.message)
            .field("console_settings", &self.console_settings)
            .field("has_decrypt_key", &self.decrypt_key.is_some())
            .finish()
    }
}

/// FIFO of entries waiting for a renderer.
///
/// Not a ring buffer: nothing is evicted, growth is bounded only by the
/// next drain.
#[derive(Debug, Default)]
pub struct MessageBuffer {
    entries: VecDeque<RenderQueueEntry>,
}

impl MessageBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: RenderQueueEntry) {
        self.entries.push_back(entry);
    }

    /// Removes and returns every entry in arrival order.
    pub fn drain(&mut self) -> Vec<RenderQueueEntry> {
        std::mem::take(&mut self.entries).into()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(m: &str) -> RenderQueueEntry {
        RenderQueueEntry {
            message: WireMessage {
                m: m.to_string(),
                ..Default::default()
            },
            console_settings: None,
            decrypt_key: None,
        }
    }

    #[test]
    fn test_drain_preserves_order_exactly_once() {
        let mut buffer = MessageBuffer::new();
        for i in 0..50 {
            buffer.push(entry(&i.to_string()));
        }
        assert_eq!(buffer.len(), 50);

        let drained = buffer.drain();
        let payloads: Vec<_> = drained.iter().map(|e| e.message.m.clone()).collect();
        let expected: Vec<_> = (0..50).map(|i| i.to_string()).collect();
        assert_eq!(payloads, expected);

        assert!(buffer.is_empty());
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn test_push_after_drain_goes_to_next_drain() {
        let mut buffer = MessageBuffer::new();
        buffer.push(entry("a"));
        assert_eq!(buffer.drain().len(), 1);
        buffer.push(entry("b"));
        let next = buffer.drain();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].message.m, "b");
    }

    #[test]
    fn test_debug_hides_decrypt_key() {
        let mut e = entry("x");
        e.decrypt_key = Some("super-secret".into());
        let printed = format!("{e:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("has_decrypt_key: true"));
    }
}
