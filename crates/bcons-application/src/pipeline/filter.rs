//! Visibility gates.

use bcons_core::message::WireMessage;
use bcons_core::user::ConsoleSettings;

/// Returns the settings when they let `message` through to the console.
pub fn enabled_settings<'a>(
    message: &WireMessage,
    settings: Option<&'a ConsoleSettings>,
) -> Option<&'a ConsoleSettings> {
    settings.filter(|s| s.allows(&message.mt))
}

/// Whether the domain, endpoint or file of `message` is on a block-list.
pub fn is_hidden(message: &WireMessage, settings: &ConsoleSettings) -> bool {
    settings.hides_domain(&message.h)
        || settings.hides_url(message.endpoint())
        || settings.hides_file(message.file_basename())
}
