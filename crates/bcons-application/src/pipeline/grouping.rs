//! Console group tracking.

use bcons_core::console::ConsoleSink;
use bcons_core::message::GroupData;

/// Ids of the currently open console groups, innermost last.
///
/// Owned by one pipeline instance. Every push emits a console group and
/// every pop a group end, so the console and the stack never disagree.
#[derive(Debug, Default)]
pub struct GroupStack {
    ids: Vec<String>,
}

impl GroupStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn top(&self) -> Option<&str> {
        self.ids.last().map(String::as_str)
    }

    /// Opens `group` unless a group with the same id is already open
    /// anywhere in the stack.
    pub fn enter(&mut self, group: &GroupData, console: &mut dyn ConsoleSink) {
        if self.ids.iter().any(|id| *id == group.id) {
            return;
        }
        console.group(&group.label, group.collapsed);
        self.ids.push(group.id.clone());
    }

    /// Closes the innermost group. Does nothing when none is open.
    pub fn pop(&mut self, console: &mut dyn ConsoleSink) {
        if self.ids.pop().is_some() {
            console.group_end();
        }
    }

    /// Closes every open group.
    pub fn close_all(&mut self, console: &mut dyn ConsoleSink) {
        while !self.ids.is_empty() {
            self.pop(console);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcons_core::console::{ConsoleCall, RecordingConsole};

    fn group(id: &str) -> GroupData {
        GroupData {
            id: id.to_string(),
            label: format!("label {id}"),
            collapsed: false,
        }
    }

    #[test]
    fn test_reentering_top_group_is_a_no_op() {
        let mut console = RecordingConsole::new();
        let mut stack = GroupStack::new();
        stack.enter(&group("g1"), &mut console);
        stack.enter(&group("g1"), &mut console);
        assert_eq!(stack.len(), 1);
        assert_eq!(console.calls().len(), 1);
    }

    #[test]
    fn test_reentering_outer_group_keeps_inner_ones_open() {
        let mut console = RecordingConsole::new();
        let mut stack = GroupStack::new();
        stack.enter(&group("g1"), &mut console);
        stack.enter(&group("g2"), &mut console);
        stack.enter(&group("g1"), &mut console);

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.top(), Some("g2"));
        assert_eq!(
            console.calls(),
            vec![
                ConsoleCall::Group {
                    label: "label g1".into(),
                    collapsed: false
                },
                ConsoleCall::Group {
                    label: "label g2".into(),
                    collapsed: false
                },
            ]
        );
    }

    #[test]
    fn test_pop_never_goes_negative() {
        let mut console = RecordingConsole::new();
        let mut stack = GroupStack::new();
        stack.pop(&mut console);
        stack.close_all(&mut console);
        assert!(stack.is_empty());
        assert!(console.calls().is_empty());
    }
}
