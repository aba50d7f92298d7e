use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;
use crate::error::{BconsError, Result};

/// Message type (`mt`).
///
/// Unknown codes are preserved so they can still be filtered and rendered
/// with the default badge color.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    #[default]
    Log,
    Warning,
    Error,
    Request,
    Session,
    Cookie,
    /// Backtrace rendered as the message body.
    Trace,
    Other(String),
}

impl MessageType {
    pub fn code(&self) -> &str {
        match self {
            Self::Log => "l",
            Self::Warning => "w",
            Self::Error => "e",
            Self::Request => "r",
            Self::Session => "s",
            Self::Cookie => "c",
            Self::Trace => "t",
            Self::Other(code) => code,
        }
    }

    /// Background color of the type badge.
    pub fn badge_color(&self) -> &'static str {
        match self {
            Self::Warning => "#a09c1c",
            Self::Error => "#a01c1c",
            Self::Request => "#1ca03b",
            Self::Session => "#881ca0",
            Self::Cookie => "#211ca0",
            Self::Log | Self::Trace | Self::Other(_) => "#1c86a0",
        }
    }

    pub fn label(&self) -> String {
        self.code().to_uppercase()
    }
}

impl From<String> for MessageType {
    fn from(code: String) -> Self {
        match code.as_str() {
            "l" => Self::Log,
            "w" => Self::Warning,
            "e" => Self::Error,
            "r" => Self::Request,
            "s" => Self::Session,
            "c" => Self::Cookie,
            "t" => Self::Trace,
            _ => Self::Other(code),
        }
    }
}

impl From<&str> for MessageType {
    fn from(code: &str) -> Self {
        Self::from(code.to_string())
    }
}

impl From<MessageType> for String {
    fn from(mt: MessageType) -> Self {
        mt.code().to_string()
    }
}

/// Content type (`ct`) of the message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentType {
    /// `"d"`: body is JSON data.
    Data,
    /// `"r"`: body is JSON rendered as a table.
    Table,
    /// Anything else: body is (possibly HTML-tainted) text.
    Text(String),
}

impl Default for ContentType {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl ContentType {
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Data | Self::Table)
    }
}

impl From<String> for ContentType {
    fn from(code: String) -> Self {
        match code.as_str() {
            "d" => Self::Data,
            "r" => Self::Table,
            _ => Self::Text(code),
        }
    }
}

impl From<&str> for ContentType {
    fn from(code: &str) -> Self {
        Self::from(code.to_string())
    }
}

impl From<ContentType> for String {
    fn from(ct: ContentType) -> Self {
        match ct {
            ContentType::Data => "d".to_string(),
            ContentType::Table => "r".to_string(),
            ContentType::Text(code) => code,
        }
    }
}

/// A console group opened by a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupData {
    #[serde(deserialize_with = "lenient::string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string_or_number")]
    pub label: String,
    #[serde(default, deserialize_with = "lenient::truthy")]
    pub collapsed: bool,
}

/// One frame of a server-side backtrace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktraceFrame {
    #[serde(default, deserialize_with = "lenient::string_or_number")]
    pub file: String,
    #[serde(default, deserialize_with = "lenient::string_or_number")]
    pub line: String,
    #[serde(default, deserialize_with = "lenient::string_or_number")]
    pub code: String,
}

/// Decoded extra data (`x`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraData {
    #[serde(default, deserialize_with = "lenient::truthy")]
    pub clear_console: bool,
    #[serde(default, deserialize_with = "lenient::truthy")]
    pub group_end: bool,
    #[serde(default)]
    pub group_data: Option<GroupData>,
    /// Ping label; any truthy value marks the message as a ping.
    #[serde(default)]
    pub ping: Option<Value>,
    #[serde(default, deserialize_with = "lenient::truthy")]
    pub trace_is_msg: bool,
    #[serde(default)]
    pub php_bt: Option<Vec<BacktraceFrame>>,
    /// Column hints for tabular content.
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ExtraData {
    /// The untrimmed ping label, or `None` when the message is not a ping.
    pub fn ping_label(&self) -> Option<String> {
        let ping = self.ping.as_ref().filter(|v| lenient::is_truthy(v))?;
        match ping {
            Value::Bool(_) => Some(String::new()),
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// The `x` field: either decoded extra data or a sealed string (ciphertext
/// while encrypted, JSON text otherwise).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Extra {
    Data(ExtraData),
    Sealed(String),
}

impl Default for Extra {
    fn default() -> Self {
        Self::Data(ExtraData::default())
    }
}

/// A bcons wire message.
///
/// Encrypted messages (`e == 1`) carry ciphertext in `m`, `h`, `url`, `v`,
/// `fl`, `fn` and `x`; a successful decryption replaces them with plaintext
/// and clears `encrypted`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(default)]
    pub mt: MessageType,
    #[serde(default)]
    pub ct: ContentType,
    /// Payload.
    #[serde(default, deserialize_with = "lenient::string_or_number")]
    pub m: String,
    /// Domain.
    #[serde(default, deserialize_with = "lenient::string_or_number")]
    pub h: String,
    #[serde(default, deserialize_with = "lenient::string_or_number")]
    pub url: String,
    /// HTTP verb.
    #[serde(default, deserialize_with = "lenient::string_or_number")]
    pub v: String,
    /// Source line.
    #[serde(default, deserialize_with = "lenient::string_or_number")]
    pub fl: String,
    /// Source file.
    #[serde(
        rename = "fn",
        default,
        deserialize_with = "lenient::string_or_number"
    )]
    pub file: String,
    #[serde(
        rename = "e",
        default,
        deserialize_with = "lenient::truthy",
        serialize_with = "lenient::flag"
    )]
    pub encrypted: bool,
    /// Project id.
    #[serde(default, deserialize_with = "lenient::string_or_number")]
    pub p: String,
    #[serde(default)]
    pub x: Option<Extra>,
}

impl WireMessage {
    /// Parses a wire message from its JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| BconsError::malformed(format!("wire message: {e}")))
    }

    /// Decodes plaintext extra data.
    ///
    /// A sealed string is parsed as JSON; an empty one means no extra data.
    pub fn extra_data(&self) -> Result<ExtraData> {
        match &self.x {
            None => Ok(ExtraData::default()),
            Some(Extra::Data(data)) => Ok(data.clone()),
            Some(Extra::Sealed(text)) if text.trim().is_empty() => Ok(ExtraData::default()),
            Some(Extra::Sealed(text)) => serde_json::from_str(text)
                .map_err(|e| BconsError::malformed(format!("extra data: {e}"))),
        }
    }

    /// Request URL without its query string.
    pub fn endpoint(&self) -> &str {
        self.url.split('?').next().unwrap_or_default()
    }

    /// File name without its directory path.
    pub fn file_basename(&self) -> &str {
        self.file.rsplit('/').next().unwrap_or_default()
    }

    /// `"<basename> (<line>)"`, or empty when either part is missing.
    pub fn file_label(&self) -> String {
        if self.file.is_empty() || self.fl.is_empty() {
            return String::new();
        }
        format!("{} ({})", self.file_basename(), self.fl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_message() {
        let msg = WireMessage::from_json(
            r#"{"mt":"e","ct":"d","m":"{\"a\":1}","h":"shop.test","url":"/api/cart?id=3",
                "v":"GET","fl":42,"fn":"/var/www/src/Cart.php","e":0,"p":"proj1",
                "x":{"groupData":{"id":7,"label":"cart","collapsed":1}}}"#,
        )
        .unwrap();

        assert_eq!(msg.mt, MessageType::Error);
        assert_eq!(msg.ct, ContentType::Data);
        assert_eq!(msg.fl, "42");
        assert!(!msg.encrypted);
        assert_eq!(msg.endpoint(), "/api/cart");
        assert_eq!(msg.file_basename(), "Cart.php");
        assert_eq!(msg.file_label(), "Cart.php (42)");

        let extra = msg.extra_data().unwrap();
        let group = extra.group_data.unwrap();
        assert_eq!(group.id, "7");
        assert!(group.collapsed);
    }

    #[test]
    fn test_unknown_types_are_preserved() {
        let msg = WireMessage::from_json(r#"{"mt":"z","ct":"html","m":"hi"}"#).unwrap();
        assert_eq!(msg.mt, MessageType::Other("z".into()));
        assert_eq!(msg.mt.badge_color(), MessageType::Log.badge_color());
        assert_eq!(msg.ct, ContentType::Text("html".into()));

        let back = serde_json::to_value(&msg).unwrap();
        assert_eq!(back["mt"], "z");
        assert_eq!(back["ct"], "html");
        assert_eq!(back["e"], 0);
    }

    #[test]
    fn test_sealed_extra_is_parsed_as_json() {
        let msg = WireMessage {
            x: Some(Extra::Sealed(r#"{"clearConsole":true,"ping":"here"}"#.into())),
            ..Default::default()
        };
        let extra = msg.extra_data().unwrap();
        assert!(extra.clear_console);
        assert_eq!(extra.ping_label().as_deref(), Some("here"));
    }

    #[test]
    fn test_malformed_sealed_extra_is_rejected() {
        let msg = WireMessage {
            x: Some(Extra::Sealed("{oops".into())),
            ..Default::default()
        };
        assert!(msg.extra_data().unwrap_err().is_malformed());
    }

    #[test]
    fn test_ping_label_variants() {
        let extra: ExtraData = serde_json::from_value(json!({ "ping": true })).unwrap();
        assert_eq!(extra.ping_label().as_deref(), Some(""));

        let extra: ExtraData = serde_json::from_value(json!({ "ping": 7 })).unwrap();
        assert_eq!(extra.ping_label().as_deref(), Some("7"));

        let extra: ExtraData = serde_json::from_value(json!({ "ping": " " })).unwrap();
        assert_eq!(extra.ping_label().as_deref(), Some(" "));

        for falsy in [json!(false), json!(""), json!(0), json!(null)] {
            let extra: ExtraData = serde_json::from_value(json!({ "ping": falsy })).unwrap();
            assert_eq!(extra.ping_label(), None, "ping {falsy}");
        }

        let extra: ExtraData = serde_json::from_value(json!({})).unwrap();
        assert_eq!(extra.ping_label(), None);
    }

    #[test]
    fn test_endpoint_and_file_label_with_missing_parts() {
        let msg = WireMessage {
            url: String::new(),
            file: "index.php".into(),
            ..Default::default()
        };
        assert_eq!(msg.endpoint(), "");
        assert_eq!(msg.file_label(), "");
    }
}
