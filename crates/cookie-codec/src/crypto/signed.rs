//! HMAC-SHA256 signed values: tamper-evident, not confidential.
//!
//! # Wire layout (version 1, big-endian)
//!
//! ```text
//! offset  size  field
//! 0       1     version = 0x01
//! 1       8     issued_at
//! 9       32    HMAC-SHA256(sign sub-key, bound context ‖ payload)
//! 41      n     payload
//! ```

use bytes::{Buf, BufMut};
use common::CookieError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::{bound_context, EnvelopeError, Opened, Secret, TIMESTAMP_LEN, VERSION};
use crate::clock::{Clock, SystemClock};

type HmacSha256 = Hmac<Sha256>;

/// Byte length of the HMAC-SHA256 tag.
pub const SIG_LEN: usize = 32;

/// Bytes preceding the payload.
pub const HEADER_LEN: usize = 1 + TIMESTAMP_LEN + SIG_LEN;

/// Sign `payload` under cookie `name`, stamped with the current system time.
///
/// # Errors
///
/// Returns [`CookieError::Internal`] if the name cannot be bound.
pub fn sign(name: &str, secret: &Secret, payload: &[u8]) -> Result<Vec<u8>, CookieError> {
    sign_at(name, secret, payload, SystemClock.now_unix())
}

/// Sign `payload` with an explicit issue timestamp.
///
/// # Errors
///
/// See [`sign`].
pub fn sign_at(
    name: &str,
    secret: &Secret,
    payload: &[u8],
    issued_at: u64,
) -> Result<Vec<u8>, CookieError> {
    let tag = compute_tag(name, secret, issued_at, payload).map_err(EnvelopeError::internal)?;

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.put_u8(VERSION);
    out.put_u64(issued_at);
    out.put_slice(&tag);
    out.put_slice(payload);
    Ok(out)
}

/// Check a value produced by [`sign`] for the same `name` and return its payload.
///
/// # Errors
///
/// Returns [`CookieError::InvalidValue`] on truncation, an unknown version or
/// any signature mismatch.
pub fn verify(name: &str, secret: &Secret, signed: &[u8]) -> Result<Opened, CookieError> {
    try_verify(name, secret, signed).map_err(EnvelopeError::rejected)
}

fn try_verify(name: &str, secret: &Secret, signed: &[u8]) -> Result<Opened, EnvelopeError> {
    if signed.len() < HEADER_LEN {
        return Err(EnvelopeError::Truncated);
    }
    let mut buf = signed;
    let version = buf.get_u8();
    if version != VERSION {
        return Err(EnvelopeError::UnsupportedVersion(version));
    }
    let issued_at = buf.get_u64();
    let (tag, payload) = buf.split_at(SIG_LEN);

    let mut mac = keyed_mac(name, secret, issued_at)?;
    mac.update(payload);
    mac.verify_slice(tag)
        .map_err(|_| EnvelopeError::Authentication)?;

    Ok(Opened {
        issued_at,
        payload: payload.to_vec(),
    })
}

fn compute_tag(
    name: &str,
    secret: &Secret,
    issued_at: u64,
    payload: &[u8],
) -> Result<[u8; SIG_LEN], EnvelopeError> {
    let mut mac = keyed_mac(name, secret, issued_at)?;
    mac.update(payload);
    let mut tag = [0u8; SIG_LEN];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    Ok(tag)
}

fn keyed_mac(name: &str, secret: &Secret, issued_at: u64) -> Result<HmacSha256, EnvelopeError> {
    let ctx = bound_context(name, issued_at)?;
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.sign_key())
        .map_err(|_| EnvelopeError::Primitive)?;
    mac.update(&ctx);
    Ok(mac)
}
