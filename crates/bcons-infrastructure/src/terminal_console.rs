//! Terminal rendering of console output.

use std::collections::BTreeSet;
use std::io::{self, Write};

use bcons_core::console::{ConsoleContent, ConsoleLine, ConsoleSink};
use colored::Colorize;
use serde_json::Value;

const INDENT: &str = "  ";

/// Renders console output to a terminal using truecolor badges.
pub struct TerminalConsole<W: Write + Send> {
    out: W,
    depth: usize,
    timestamps: bool,
}

impl TerminalConsole<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalConsole<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            depth: 0,
            timestamps: false,
        }
    }

    /// Prefixes every line with the local time.
    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        let prefix = if self.timestamps {
            format!("{} ", chrono::Local::now().format("%H:%M:%S%.3f").to_string().dimmed())
        } else {
            String::new()
        };
        let indent = INDENT.repeat(self.depth);
        for line in text.lines() {
            if let Err(e) = writeln!(self.out, "{prefix}{indent}{line}") {
                tracing::warn!("terminal console write failed: {}", e);
                return;
            }
        }
    }
}

/// Parses `#rgb` / `#rrggbb`.
fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    let expand = |c: char| c.to_digit(16).map(|d| (d * 17) as u8);
    match hex.len() {
        3 => {
            let mut chars = hex.chars();
            Some((
                expand(chars.next()?)?,
                expand(chars.next()?)?,
                expand(chars.next()?)?,
            ))
        }
        6 => Some((
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        )),
        _ => None,
    }
}

fn render_line(line: &ConsoleLine) -> String {
    let badges: String = line
        .badges
        .iter()
        .filter(|b| !b.text.is_empty())
        .map(|badge| {
            let text = format!(" {} ", badge.text);
            match parse_hex_color(badge.color) {
                Some((r, g, b)) => text.white().on_truecolor(r, g, b).to_string(),
                None => text.white().to_string(),
            }
        })
        .collect();

    let content = match &line.content {
        ConsoleContent::Text(text) => text.clone(),
        ConsoleContent::Json(value) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
    };
    format!("{badges} {content}")
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Renders `data` as an aligned text table.
///
/// Rows come from an array or the values of an object; columns from the
/// hint, or from the union of row keys. Scalar rows use a `Value` column.
pub(crate) fn format_table(data: &Value, columns: Option<&[String]>) -> Vec<String> {
    let rows: Vec<(String, &Value)> = match data {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        scalar => vec![("0".to_string(), scalar)],
    };

    let columns: Vec<String> = match columns {
        Some(cols) if !cols.is_empty() => cols.to_vec(),
        _ => {
            let mut keys = BTreeSet::new();
            let mut has_scalar = false;
            for (_, row) in &rows {
                match row {
                    Value::Object(map) => keys.extend(map.keys().cloned()),
                    _ => has_scalar = true,
                }
            }
            let mut cols: Vec<String> = keys.into_iter().collect();
            if has_scalar {
                cols.push("Value".to_string());
            }
            cols
        }
    };

    let mut header = vec!["(index)".to_string()];
    header.extend(columns.iter().cloned());

    let mut table = vec![header];
    for (index, row) in &rows {
        let mut cells = vec![index.clone()];
        for col in &columns {
            let value = match row {
                Value::Object(map) => cell(map.get(col)),
                scalar if col == "Value" => cell(Some(scalar)),
                _ => String::new(),
            };
            cells.push(value);
        }
        table.push(cells);
    }

    let widths: Vec<usize> = (0..table[0].len())
        .map(|i| table.iter().map(|r| r[i].chars().count()).max().unwrap_or(0))
        .collect();

    table
        .iter()
        .map(|row| {
            row.iter()
                .zip(&widths)
                .map(|(c, w)| format!("{c:<w$}"))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        })
        .collect()
}

impl<W: Write + Send> ConsoleSink for TerminalConsole<W> {
    fn clear(&mut self) {
        self.emit(&"--- console cleared ---".dimmed().to_string());
    }

    fn group(&mut self, label: &str, collapsed: bool) {
        let marker = if collapsed { "▶" } else { "▼" };
        self.emit(&format!("{marker} {}", label.bold()));
        self.depth += 1;
    }

    fn group_end(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn log(&mut self, line: ConsoleLine) {
        let rendered = render_line(&line);
        self.emit(&rendered);
    }

    fn table(&mut self, data: Value, columns: Option<Vec<String>>) {
        let rows = format_table(&data, columns.as_deref());
        self.emit(&rows.join("\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcons_core::console::Badge;
    use serde_json::json;

    fn output(console: TerminalConsole<Vec<u8>>) -> String {
        String::from_utf8(console.into_inner()).unwrap()
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(parse_hex_color("#373"), Some((0x33, 0x77, 0x33)));
        assert_eq!(parse_hex_color("#a37500"), Some((0xa3, 0x75, 0x00)));
        assert_eq!(parse_hex_color("red"), None);
        assert_eq!(parse_hex_color("#12"), None);
    }

    #[test]
    fn test_groups_indent_their_lines() {
        colored::control::set_override(false);
        let mut console = TerminalConsole::new(Vec::new());
        console.group("checkout", false);
        console.log(ConsoleLine::new(
            vec![Badge::new("L", "#1c86a0")],
            ConsoleContent::Text("inside".into()),
        ));
        console.group_end();
        console.group_end();
        console.log(ConsoleLine::new(vec![], ConsoleContent::Text("outside".into())));

        let text = output(console);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "▼ checkout");
        assert_eq!(lines[1], "   L  inside");
        assert_eq!(lines[2], " outside");
    }

    #[test]
    fn test_table_from_array_of_objects() {
        let data = json!([{ "id": 1, "name": "a" }, { "id": 2, "name": "bb" }]);
        let rows = format_table(&data, None);
        assert_eq!(rows[0], "(index) | id | name");
        assert_eq!(rows[1], "0       | 1  | a");
        assert_eq!(rows[2], "1       | 2  | bb");
    }

    #[test]
    fn test_table_respects_column_hints() {
        let data = json!({ "x": { "id": 1, "name": "a" } });
        let rows = format_table(&data, Some(&["name".to_string()]));
        assert_eq!(rows, vec!["(index) | name", "x       | a"]);
    }

    #[test]
    fn test_table_of_scalars() {
        let rows = format_table(&json!(["a", "b"]), None);
        assert_eq!(rows, vec!["(index) | Value", "0       | a", "1       | b"]);
    }
}
