//! AES-256-GCM-SIV sealed envelopes.
//!
//! # Wire layout (version 1, big-endian)
//!
//! ```text
//! offset  size    field
//! 0       1       version = 0x01
//! 1       8       issued_at, seconds since the Unix epoch
//! 9       12      nonce
//! 21      n + 16  ciphertext of the payload, then the 16-byte tag
//! ```
//!
//! The bound context (see [`super`]) is passed as associated data, so the
//! tag covers name ‖ timestamp ‖ payload while only timestamp and ciphertext
//! travel. A fresh random nonce is drawn from the OS CSPRNG on every seal;
//! GCM-SIV additionally keeps a repeated nonce from revealing the key stream.

use aes_gcm_siv::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng, Payload},
    Aes256GcmSiv, Nonce,
};
use bytes::{Buf, BufMut};
use common::CookieError;

use super::{bound_context, EnvelopeError, Opened, Secret, TIMESTAMP_LEN, VERSION};
use crate::clock::{Clock, SystemClock};

/// Byte length of an AES-GCM-SIV nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the AES-GCM-SIV authentication tag.
pub const TAG_LEN: usize = 16;

/// Bytes preceding the ciphertext.
pub const HEADER_LEN: usize = 1 + TIMESTAMP_LEN + NONCE_LEN;

/// Smallest well-formed envelope: header plus tag over an empty payload.
pub const MIN_LEN: usize = HEADER_LEN + TAG_LEN;

/// Seal `payload` under cookie `name`, stamped with the current system time.
///
/// # Errors
///
/// Returns [`CookieError::Internal`] if the name cannot be bound or the cipher
/// fails. Neither happens with a valid name.
pub fn seal(name: &str, secret: &Secret, payload: &[u8]) -> Result<Vec<u8>, CookieError> {
    seal_at(name, secret, payload, SystemClock.now_unix())
}

/// Seal `payload` under cookie `name` with an explicit issue timestamp.
///
/// # Errors
///
/// See [`seal`].
pub fn seal_at(
    name: &str,
    secret: &Secret,
    payload: &[u8],
    issued_at: u64,
) -> Result<Vec<u8>, CookieError> {
    try_seal(name, secret, payload, issued_at).map_err(EnvelopeError::internal)
}

/// Verify and decrypt an envelope produced by [`seal`] for the same `name`.
///
/// No plaintext is released unless the tag over the whole bound context
/// verifies.
///
/// # Errors
///
/// Returns [`CookieError::InvalidValue`] on truncation, an unknown version, a
/// wrong secret, a different cookie name, or any modified byte.
pub fn open(name: &str, secret: &Secret, envelope: &[u8]) -> Result<Opened, CookieError> {
    try_open(name, secret, envelope).map_err(EnvelopeError::rejected)
}

fn try_seal(
    name: &str,
    secret: &Secret,
    payload: &[u8],
    issued_at: u64,
) -> Result<Vec<u8>, EnvelopeError> {
    let aad = bound_context(name, issued_at)?;
    let cipher = build_cipher(secret)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);

    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: payload,
                aad: &aad,
            },
        )
        .map_err(|_| EnvelopeError::Primitive)?;

    let mut out = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    out.put_u8(VERSION);
    out.put_u64(issued_at);
    out.put_slice(&nonce_bytes);
    out.put_slice(&ciphertext);
    Ok(out)
}

fn try_open(name: &str, secret: &Secret, envelope: &[u8]) -> Result<Opened, EnvelopeError> {
    if envelope.len() < MIN_LEN {
        return Err(EnvelopeError::Truncated);
    }
    let mut buf = envelope;
    let version = buf.get_u8();
    if version != VERSION {
        return Err(EnvelopeError::UnsupportedVersion(version));
    }
    let issued_at = buf.get_u64();
    let (nonce, ciphertext) = buf.split_at(NONCE_LEN);

    let aad = bound_context(name, issued_at)?;
    let cipher = build_cipher(secret)?;
    let payload = cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: &aad,
            },
        )
        .map_err(|_| EnvelopeError::Authentication)?;

    Ok(Opened { issued_at, payload })
}

fn build_cipher(secret: &Secret) -> Result<Aes256GcmSiv, EnvelopeError> {
    Aes256GcmSiv::new_from_slice(secret.encrypt_key()).map_err(|_| EnvelopeError::Primitive)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_HEX: &str = "13d6b4dff8f84a10851021ec8608f814570d562c92fe6b5ec4c9f595bcb3234b";

    fn secret() -> Secret {
        Secret::from_hex(TEST_HEX).unwrap()
    }

    fn other_secret() -> Secret {
        Secret::from_bytes(&[0x42u8; 32]).unwrap()
    }

    #[test]
    fn seal_open_round_trip() {
        let s = secret();
        let sealed = seal_at("exampleCookie", &s, b"Hello world!", 1_700_000_000).unwrap();
        let opened = open("exampleCookie", &s, &sealed).unwrap();
        assert_eq!(opened.payload, b"Hello world!");
        assert_eq!(opened.issued_at, 1_700_000_000);
    }

    #[test]
    fn layout_is_fixed() {
        let s = secret();
        let sealed = seal_at("c", &s, b"abcd", 0x0102_0304_0506_0708).unwrap();
        assert_eq!(sealed.len(), HEADER_LEN + 4 + TAG_LEN);
        assert_eq!(sealed[0], VERSION);
        assert_eq!(&sealed[1..9], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn empty_payload_round_trip() {
        let s = secret();
        let sealed = seal("c", &s, b"").unwrap();
        assert_eq!(sealed.len(), MIN_LEN);
        assert!(open("c", &s, &sealed).unwrap().payload.is_empty());
    }

    #[test]
    fn nonce_is_fresh_per_seal() {
        let s = secret();
        let a = seal_at("c", &s, b"same", 1).unwrap();
        let b = seal_at("c", &s, b"same", 1).unwrap();
        assert_ne!(a[9..HEADER_LEN], b[9..HEADER_LEN]);
        assert_ne!(a, b);
    }

    #[test]
    fn payload_is_not_visible() {
        let s = secret();
        let sealed = seal("c", &s, b"plaintext-marker").unwrap();
        assert!(!sealed
            .windows(b"plaintext-marker".len())
            .any(|w| w == b"plaintext-marker"));
    }

    #[test]
    fn other_name_rejected() {
        let s = secret();
        let sealed = seal("exampleCookie", &s, b"Hello world!").unwrap();
        assert_eq!(
            open("otherCookie", &s, &sealed),
            Err(CookieError::InvalidValue)
        );
    }

    #[test]
    fn wrong_secret_rejected() {
        let sealed = seal("c", &secret(), b"x").unwrap();
        assert_eq!(
            open("c", &other_secret(), &sealed),
            Err(CookieError::InvalidValue)
        );
    }

    #[test]
    fn every_flipped_byte_rejected() {
        let s = secret();
        let sealed = seal("c", &s, b"tamper me").unwrap();
        for i in 0..sealed.len() {
            let mut tampered = sealed.clone();
            tampered[i] ^= 0x01;
            assert_eq!(
                open("c", &s, &tampered),
                Err(CookieError::InvalidValue),
                "byte {i} flip accepted"
            );
        }
    }

    #[test]
    fn truncated_rejected() {
        let s = secret();
        let sealed = seal("c", &s, b"payload").unwrap();
        for len in [0, 1, HEADER_LEN, MIN_LEN - 1, sealed.len() - 1] {
            assert_eq!(
                open("c", &s, &sealed[..len]),
                Err(CookieError::InvalidValue)
            );
        }
    }

    #[test]
    fn unknown_version_rejected() {
        let s = secret();
        let mut sealed = seal("c", &s, b"payload").unwrap();
        sealed[0] = 0x02;
        assert_eq!(
            try_open("c", &s, &sealed),
            Err(EnvelopeError::UnsupportedVersion(2))
        );
    }

    #[test]
    fn timestamp_is_authenticated() {
        let s = secret();
        let mut sealed = seal_at("c", &s, b"payload", 1000).unwrap();
        sealed[8] ^= 0x01;
        assert_eq!(try_open("c", &s, &sealed), Err(EnvelopeError::Authentication));
    }
}
