//! Console output abstraction.
//!
//! The pipeline emits at most one [`ConsoleCall`]-worth of output per message
//! through a [`ConsoleSink`]. Sinks decide how to present it: devtools
//! argument lists, a colored terminal, or a recording for tests.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;

/// Domain badge color.
pub const DOMAIN_COLOR: &str = "#a37500";
/// Verb + endpoint badge color.
pub const URL_COLOR: &str = "#006ca2";
/// File/line badge color.
pub const FILE_COLOR: &str = "#454";
/// Ping badge color.
pub const PING_COLOR: &str = "#373";

/// A colored, rounded-corner label prefixed to a log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub text: String,
    pub color: &'static str,
    pub round_start: bool,
    pub round_end: bool,
}

impl Badge {
    pub fn new(text: impl Into<String>, color: &'static str) -> Self {
        Self {
            text: text.into(),
            color,
            round_start: false,
            round_end: false,
        }
    }

    /// CSS used for the badge's `%c` directive.
    pub fn style(&self) -> String {
        let mut borders = String::new();
        if self.round_start {
            borders.push_str("border-start-start-radius: 3px;border-end-start-radius: 3px;");
        }
        if self.round_end {
            borders.push_str("border-end-end-radius: 3px;border-start-end-radius: 3px;");
        }
        format!("{borders}color:white;padding:1px 5px;background:{};", self.color)
    }
}

/// Decoded message body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConsoleContent {
    Json(Value),
    Text(String),
}

impl ConsoleContent {
    pub fn to_value(&self) -> Value {
        match self {
            Self::Json(v) => v.clone(),
            Self::Text(s) => Value::String(s.clone()),
        }
    }
}

/// One log line: badges left to right, then the content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsoleLine {
    pub badges: Vec<Badge>,
    pub content: ConsoleContent,
}

impl ConsoleLine {
    /// Builds a line, rounding the outer edges of the first and last badge.
    pub fn new(mut badges: Vec<Badge>, content: ConsoleContent) -> Self {
        for badge in badges.iter_mut() {
            badge.round_start = false;
            badge.round_end = false;
        }
        if let Some(first) = badges.first_mut() {
            first.round_start = true;
        }
        if let Some(last) = badges.last_mut() {
            last.round_end = true;
        }
        Self { badges, content }
    }

    /// Argument list for devtools `console.log`: format string, one style
    /// per badge, then the content.
    pub fn devtools_args(&self) -> Vec<Value> {
        let format: String = self
            .badges
            .iter()
            .map(|b| format!("%c{}", b.text))
            .collect();

        let mut args = Vec::with_capacity(self.badges.len() + 2);
        args.push(Value::String(format));
        args.extend(self.badges.iter().map(|b| Value::String(b.style())));
        args.push(self.content.to_value());
        args
    }
}

/// Receiver of console output.
pub trait ConsoleSink: Send {
    fn clear(&mut self);

    fn group(&mut self, label: &str, collapsed: bool);

    fn group_end(&mut self);

    fn log(&mut self, line: ConsoleLine);

    fn table(&mut self, data: Value, columns: Option<Vec<String>>);
}

/// A console emission, as recorded by [`RecordingConsole`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCall {
    Clear,
    Group { label: String, collapsed: bool },
    GroupEnd,
    Log(ConsoleLine),
    Table {
        data: Value,
        columns: Option<Vec<String>>,
    },
}

/// Records every call; clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingConsole {
    calls: Arc<Mutex<Vec<ConsoleCall>>>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ConsoleCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Only the log lines, in order.
    pub fn lines(&self) -> Vec<ConsoleLine> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ConsoleCall::Log(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ConsoleCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl ConsoleSink for RecordingConsole {
    fn clear(&mut self) {
        self.record(ConsoleCall::Clear);
    }

    fn group(&mut self, label: &str, collapsed: bool) {
        self.record(ConsoleCall::Group {
            label: label.to_string(),
            collapsed,
        });
    }

    fn group_end(&mut self) {
        self.record(ConsoleCall::GroupEnd);
    }

    fn log(&mut self, line: ConsoleLine) {
        self.record(ConsoleCall::Log(line));
    }

    fn table(&mut self, data: Value, columns: Option<Vec<String>>) {
        self.record(ConsoleCall::Table { data, columns });
    }
}
