//! `Set-Cookie` serialization and `Cookie` header lookup.

use std::fmt;

use common::CookieError;

use super::{is_valid_name, is_valid_value, MAX_COOKIE_LEN};

/// The `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        })
    }
}

/// Attributes passed through unchanged into the `Set-Cookie` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    /// `Path` attribute. Omitted when empty.
    pub path: String,
    /// `Max-Age` in seconds. Omitted when `None`.
    pub max_age: Option<u64>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
}

impl Default for CookieAttributes {
    /// Path `/`, one hour, `HttpOnly`, `Secure`, `SameSite=Lax`.
    fn default() -> Self {
        Self {
            path: "/".into(),
            max_age: Some(3600),
            http_only: true,
            secure: true,
            same_site: SameSite::Lax,
        }
    }
}

impl CookieAttributes {
    /// Override `Max-Age`.
    pub fn with_max_age(mut self, secs: u64) -> Self {
        self.max_age = Some(secs);
        self
    }
}

/// Serialize a cookie into its `Set-Cookie` header value.
///
/// The output has the shape
/// `name=value; Path=/; Max-Age=3600; HttpOnly; Secure; SameSite=Lax`.
///
/// # Errors
///
/// - [`CookieError::ValueTooLong`] if the serialized string exceeds
///   [`MAX_COOKIE_LEN`] bytes.
/// - [`CookieError::Internal`] if `name` is not a valid cookie name or
///   `encoded` contains bytes that are not cookie-octets. Both indicate a
///   caller bug on the write path.
pub fn frame(name: &str, encoded: &str, attrs: &CookieAttributes) -> Result<String, CookieError> {
    if !is_valid_name(name) {
        return Err(CookieError::Internal("invalid cookie name".into()));
    }
    if !is_valid_value(encoded) {
        return Err(CookieError::Internal(
            "cookie value contains characters outside the cookie-octet set".into(),
        ));
    }

    let mut out = String::with_capacity(name.len() + encoded.len() + 64);
    out.push_str(name);
    out.push('=');
    out.push_str(encoded);
    if !attrs.path.is_empty() {
        out.push_str(&format!("; Path={}", attrs.path));
    }
    if let Some(max_age) = attrs.max_age {
        out.push_str(&format!("; Max-Age={max_age}"));
    }
    if attrs.http_only {
        out.push_str("; HttpOnly");
    }
    if attrs.secure {
        out.push_str("; Secure");
    }
    out.push_str(&format!("; SameSite={}", attrs.same_site));

    if out.len() > MAX_COOKIE_LEN {
        return Err(CookieError::ValueTooLong);
    }
    Ok(out)
}

/// Find the value of cookie `name` in a request `Cookie` header.
///
/// Pairs are separated by `;`, surrounding whitespace is ignored and a value
/// wrapped in double quotes is unquoted. The first matching pair wins.
///
/// # Errors
///
/// Returns [`CookieError::NotFound`] if no pair carries `name`.
pub fn find_cookie<'h>(header: &'h str, name: &str) -> Result<&'h str, CookieError> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| unquote(v.trim()))
        .ok_or(CookieError::NotFound)
}

fn unquote(v: &str) -> &str {
    v.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(v)
}
