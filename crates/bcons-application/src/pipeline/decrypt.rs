//! Whole-message decryption.

use bcons_core::crypto::DerivedKey;
use bcons_core::error::Result;
use bcons_core::message::{Extra, WireMessage};

/// Decrypts every sealed field of `message` with one derived key.
///
/// All or nothing: the first field that fails aborts the whole message.
/// Sealed extra data comes back as JSON text, parsed later by
/// [`WireMessage::extra_data`]. Plaintext messages are returned untouched.
pub fn decrypt_message(mut message: WireMessage, passphrase: &str) -> Result<WireMessage> {
    if !message.encrypted {
        return Ok(message);
    }

    let key = DerivedKey::from_passphrase(passphrase);
    for field in [
        &mut message.m,
        &mut message.h,
        &mut message.url,
        &mut message.v,
        &mut message.fl,
        &mut message.file,
    ] {
        let plaintext = key.decrypt(field)?;
        *field = plaintext;
    }

    if let Some(Extra::Sealed(sealed)) = &message.x {
        let plaintext = key.decrypt(sealed)?;
        message.x = Some(Extra::Sealed(plaintext));
    }

    message.encrypted = false;
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcons_core::crypto::encrypt_field;

    fn seal(plain: &WireMessage, passphrase: &str) -> WireMessage {
        let enc = |s: &str| encrypt_field(s, passphrase).unwrap();
        WireMessage {
            m: enc(&plain.m),
            h: enc(&plain.h),
            url: enc(&plain.url),
            v: enc(&plain.v),
            fl: enc(&plain.fl),
            file: enc(&plain.file),
            x: Some(Extra::Sealed(enc(r#"{"ping":"hi"}"#))),
            encrypted: true,
            ..plain.clone()
        }
    }

    fn plain() -> WireMessage {
        WireMessage {
            m: "hello".into(),
            h: "shop.test".into(),
            url: "/cart?id=1".into(),
            v: "GET".into(),
            fl: "7".into(),
            file: "/srv/Cart.php".into(),
            p: "p1".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_every_field_is_restored() {
        let sealed = seal(&plain(), "k");
        let opened = decrypt_message(sealed, "k").unwrap();
        assert!(!opened.encrypted);
        assert_eq!(opened.m, "hello");
        assert_eq!(opened.h, "shop.test");
        assert_eq!(opened.url, "/cart?id=1");
        assert_eq!(opened.v, "GET");
        assert_eq!(opened.fl, "7");
        assert_eq!(opened.file, "/srv/Cart.php");
        assert_eq!(opened.extra_data().unwrap().ping_label().as_deref(), Some("hi"));
    }

    #[test]
    fn test_one_bad_field_fails_the_message() {
        let mut sealed = seal(&plain(), "k");
        sealed.v = "garbage".into();
        assert!(decrypt_message(sealed, "k").unwrap_err().is_decryption());
    }

    #[test]
    fn test_plaintext_message_is_untouched() {
        let msg = WireMessage {
            m: "not base64 at all".into(),
            ..plain()
        };
        let out = decrypt_message(msg.clone(), "whatever").unwrap();
        assert_eq!(out, msg);
    }
}
