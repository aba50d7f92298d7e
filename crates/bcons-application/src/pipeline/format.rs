//! Content decoding and badge assembly.

use bcons_core::console::{
    Badge, ConsoleContent, ConsoleLine, DOMAIN_COLOR, FILE_COLOR, PING_COLOR, URL_COLOR,
};
use bcons_core::error::{BconsError, Result};
use bcons_core::message::WireMessage;
use bcons_core::user::ConsoleSettings;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!--.*?-->|</?[a-zA-Z!][^>]*>").expect("valid tag regex")
});

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").expect("valid entity regex")
});

/// Text content of an HTML fragment: tags removed, entities decoded.
pub fn strip_html(input: &str) -> String {
    let without_tags = TAG_RE.replace_all(input, "");
    ENTITY_RE
        .replace_all(&without_tags, |caps: &Captures| {
            decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(entity: &str) -> Option<String> {
    if let Some(num) = entity.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    let decoded = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        _ => return None,
    };
    Some(decoded.to_string())
}

/// Decodes the body according to the content type.
///
/// Structured bodies must be valid JSON; anything else is treated as
/// untrusted markup and reduced to its text.
pub fn decode_content(message: &WireMessage) -> Result<ConsoleContent> {
    if message.ct.is_structured() {
        serde_json::from_str(&message.m)
            .map(ConsoleContent::Json)
            .map_err(|e| BconsError::malformed(format!("message body: {e}")))
    } else {
        Ok(ConsoleContent::Text(strip_html(&message.m)))
    }
}

/// Badges for `message`, left to right.
pub fn badges(message: &WireMessage, settings: &ConsoleSettings, ping: bool) -> Vec<Badge> {
    let mut badges = vec![Badge::new(message.mt.label(), message.mt.badge_color())];

    if !settings.hide_console_domain {
        badges.push(Badge::new(message.h.clone(), DOMAIN_COLOR));
    }
    if !settings.hide_console_url {
        badges.push(Badge::new(
            format!("{} {}", message.v, message.endpoint()),
            URL_COLOR,
        ));
    }
    if !settings.hide_console_file {
        badges.push(Badge::new(message.file_label(), FILE_COLOR));
    }
    if ping {
        badges.push(Badge::new("PING", PING_COLOR));
    }
    badges
}

pub fn console_line(
    message: &WireMessage,
    settings: &ConsoleSettings,
    ping: bool,
    content: ConsoleContent,
) -> ConsoleLine {
    ConsoleLine::new(badges(message, settings, ping), content)
}
