//! Cookie-level write/read operations for the three protection modes.
//!
//! Writers return the complete `Set-Cookie` header value; nothing is
//! produced unless every step succeeds. Readers take the raw request
//! `Cookie` header and the name the caller is looking up.
//!
//! | mode      | write                | read                |
//! |-----------|----------------------|---------------------|
//! | plain     | encode → frame       | find → decode       |
//! | signed    | sign → encode → frame | find → decode → verify |
//! | encrypted | seal → encode → frame | find → decode → open |

use common::CookieError;
use tracing::debug;

use crate::crypto::{envelope, signed, Opened, Secret};
use crate::record::{CookieRecord, Record};
use crate::transport::{self, CookieAttributes};

/// Write `value` base64url-encoded, without any protection.
///
/// # Errors
///
/// [`CookieError::ValueTooLong`] if the serialized cookie exceeds 4096 bytes;
/// [`CookieError::Internal`] for an invalid cookie name.
pub fn write_plain(
    name: &str,
    value: &[u8],
    attrs: &CookieAttributes,
) -> Result<String, CookieError> {
    transport::frame(name, &transport::encode(value), attrs)
}

/// Read a cookie written by [`write_plain`].
///
/// # Errors
///
/// [`CookieError::NotFound`] if absent, [`CookieError::InvalidValue`] if the
/// value is not base64url.
pub fn read_plain(cookie_header: &str, name: &str) -> Result<Vec<u8>, CookieError> {
    decode_named(cookie_header, name)
}

/// Write `value` with an HMAC-SHA256 signature bound to `name`.
///
/// # Errors
///
/// As [`write_plain`].
pub fn write_signed(
    name: &str,
    value: &[u8],
    attrs: &CookieAttributes,
    secret: &Secret,
) -> Result<String, CookieError> {
    let signed = signed::sign(name, secret, value)?;
    transport::frame(name, &transport::encode(&signed), attrs)
}

/// Read and verify a cookie written by [`write_signed`].
///
/// # Errors
///
/// [`CookieError::NotFound`] if absent, otherwise [`CookieError::InvalidValue`]
/// for any decoding or signature failure.
pub fn read_signed(cookie_header: &str, name: &str, secret: &Secret) -> Result<Opened, CookieError> {
    let raw = decode_named(cookie_header, name)?;
    signed::verify(name, secret, &raw)
}

/// Write `value` encrypted and authenticated under `name`.
///
/// # Errors
///
/// As [`write_plain`].
pub fn write_encrypted(
    name: &str,
    value: &[u8],
    attrs: &CookieAttributes,
    secret: &Secret,
) -> Result<String, CookieError> {
    let sealed = envelope::seal(name, secret, value)?;
    transport::frame(name, &transport::encode(&sealed), attrs)
}

/// Read, verify and decrypt a cookie written by [`write_encrypted`].
///
/// # Errors
///
/// [`CookieError::NotFound`] if absent, otherwise [`CookieError::InvalidValue`]
/// for any decoding, authentication or decryption failure.
pub fn read_encrypted(
    cookie_header: &str,
    name: &str,
    secret: &Secret,
) -> Result<Opened, CookieError> {
    let raw = decode_named(cookie_header, name)?;
    envelope::open(name, secret, &raw)
}

/// Serialize `value` as a [`Record`] and write it encrypted.
///
/// # Errors
///
/// [`CookieError::Internal`] if the record cannot be encoded, otherwise as
/// [`write_encrypted`].
pub fn write_encrypted_record<R: CookieRecord>(
    name: &str,
    value: &R,
    attrs: &CookieAttributes,
    secret: &Secret,
) -> Result<String, CookieError> {
    let bytes = value
        .to_record()
        .encode()
        .map_err(|e| CookieError::Internal(e.to_string()))?;
    write_encrypted(name, &bytes, attrs, secret)
}

/// Read an encrypted cookie and map its payload onto `R`.
///
/// # Errors
///
/// As [`read_encrypted`]; a payload that is not a valid record for `R` is also
/// [`CookieError::InvalidValue`].
pub fn read_encrypted_record<R: CookieRecord>(
    cookie_header: &str,
    name: &str,
    secret: &Secret,
) -> Result<R, CookieError> {
    read_encrypted(cookie_header, name, secret)?.decode_record()
}

impl Opened {
    /// Parse the payload as a [`Record`] and map it onto `R`.
    ///
    /// # Errors
    ///
    /// [`CookieError::InvalidValue`] if the payload is not a valid record for `R`.
    pub fn decode_record<R: CookieRecord>(&self) -> Result<R, CookieError> {
        let record = Record::decode(&self.payload)?;
        Ok(R::from_record(&record)?)
    }
}

fn decode_named(cookie_header: &str, name: &str) -> Result<Vec<u8>, CookieError> {
    let value = transport::find_cookie(cookie_header, name)?;
    transport::decode(value).inspect_err(|_| debug!(cookie = name, "cookie value is not base64url"))
}
