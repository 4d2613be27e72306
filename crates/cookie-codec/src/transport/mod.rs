//! Transport codec: bytes ↔ cookie-safe text, plus cookie framing.
//!
//! Values are encoded with base64url without padding (RFC 4648 §5). The
//! alphabet `A-Z a-z 0-9 - _` is a strict subset of the RFC 6265
//! cookie-octet set, so an encoded value never needs quoting.
//!
//! The 4096-byte ceiling applies to the *serialized* cookie (name, value and
//! attributes) and is enforced by [`frame`] after encoding.

pub mod frame;

pub use frame::{find_cookie, frame, CookieAttributes, SameSite};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use common::CookieError;

/// Maximum length in bytes of a serialized `Set-Cookie` value.
pub const MAX_COOKIE_LEN: usize = 4096;

/// Encode raw bytes into the cookie-value alphabet.
pub fn encode(raw: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(raw)
}

/// Decode text produced by [`encode`].
///
/// # Errors
///
/// Returns [`CookieError::InvalidValue`] if `text` contains characters outside
/// the base64url alphabet, carries `=` padding, or has an impossible length.
pub fn decode(text: &str) -> Result<Vec<u8>, CookieError> {
    URL_SAFE_NO_PAD
        .decode(text)
        .map_err(|_| CookieError::InvalidValue)
}

/// Returns `true` if `name` is a valid RFC 6265 cookie name (an RFC 7230 token).
///
/// Rejects the empty string, control characters, space, tab, non-ASCII and
/// the separators `( ) < > @ , ; : \ " / [ ] ? = { }`.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(is_token_byte)
}

/// Returns `true` if every byte of `value` is an RFC 6265 cookie-octet.
pub fn is_valid_value(value: &str) -> bool {
    value.bytes().all(is_cookie_octet)
}

fn is_token_byte(b: u8) -> bool {
    matches!(b, 0x21..=0x7e)
        && !matches!(
            b,
            b'(' | b')'
                | b'<'
                | b'>'
                | b'@'
                | b','
                | b';'
                | b':'
                | b'\\'
                | b'"'
                | b'/'
                | b'['
                | b']'
                | b'?'
                | b'='
                | b'{'
                | b'}'
        )
}

fn is_cookie_octet(b: u8) -> bool {
    matches!(b, 0x21 | 0x23..=0x2b | 0x2d..=0x3a | 0x3c..=0x5b | 0x5d..=0x7e)
}
