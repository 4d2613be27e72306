//! Cookie authentication and encryption.
//!
//! Two protection modes share one secret and one bound context:
//!
//! - [`envelope`]: AES-256-GCM-SIV sealing (confidential + authenticated).
//! - [`signed`]: HMAC-SHA256 signing (authenticated, payload readable).
//!
//! # Bound context
//!
//! Both modes authenticate, without transmitting, the cookie name and the
//! issue timestamp:
//!
//! ```text
//! "cookie-codec/v1" ‖ version u8 ‖ name_len u16 BE ‖ name ‖ issued_at u64 BE
//! ```
//!
//! The name is always the one supplied by the reader, so a value copied to a
//! different cookie name fails verification.

pub mod envelope;
pub mod secret;
pub mod signed;

pub use envelope::{open, seal, seal_at};
pub use secret::{Secret, SecretError};
pub use signed::{sign, sign_at, verify};

use std::time::Duration;

use bytes::{BufMut, BytesMut};
use common::CookieError;
use thiserror::Error;
use tracing::debug;

use crate::clock::Clock;

/// Byte length of the master secret and of each derived sub-key.
pub const KEY_LEN: usize = 32;

/// Current wire version of both envelope formats.
pub const VERSION: u8 = 0x01;

/// Byte length of the big-endian issue timestamp.
pub const TIMESTAMP_LEN: usize = 8;

/// Domain-separation label prefixed to every bound context and used as HKDF salt.
pub(crate) const PROTOCOL_LABEL: &[u8] = b"cookie-codec/v1";

/// How far in the future an issue timestamp may lie before it is rejected.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(60);

/// Reasons an envelope is rejected or cannot be produced.
///
/// Readers never see these: every rejection is reported as
/// [`CookieError::InvalidValue`]. They exist for server-side diagnostics.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("envelope shorter than the fixed header and tag")]
    Truncated,

    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u8),

    #[error("cookie name longer than 65535 bytes")]
    NameTooLong,

    /// Tag mismatch, wrong key, wrong name or corrupted ciphertext.
    #[error("authentication failed")]
    Authentication,

    /// The cipher or MAC could not be initialised or refused to run.
    #[error("primitive failure")]
    Primitive,

    #[error("issued {age_secs}s ago, exceeds allowed age")]
    Expired { age_secs: u64 },

    #[error("issue timestamp lies in the future")]
    FromTheFuture,
}

impl EnvelopeError {
    /// Collapse a read-side rejection into the boundary error.
    pub(crate) fn rejected(self) -> CookieError {
        debug!(reason = %self, "cookie rejected");
        CookieError::InvalidValue
    }

    /// Report a write-side failure as an internal error.
    pub(crate) fn internal(self) -> CookieError {
        CookieError::Internal(self.to_string())
    }
}

/// A verified payload together with the time it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opened {
    /// Issue time, seconds since the Unix epoch.
    pub issued_at: u64,
    pub payload: Vec<u8>,
}

impl Opened {
    /// Reject the value if it is older than `max_age`, or was stamped more
    /// than [`MAX_CLOCK_SKEW`] ahead of `clock`.
    ///
    /// The codec never calls this on its own: the timestamp only binds
    /// context unless the caller opts into an age limit here.
    ///
    /// # Errors
    ///
    /// Returns [`CookieError::InvalidValue`].
    pub fn ensure_fresh(&self, max_age: Duration, clock: &dyn Clock) -> Result<(), CookieError> {
        let now = clock.now_unix();
        if self.issued_at > now.saturating_add(MAX_CLOCK_SKEW.as_secs()) {
            return Err(EnvelopeError::FromTheFuture.rejected());
        }
        let age_secs = now.saturating_sub(self.issued_at);
        if age_secs > max_age.as_secs() {
            return Err(EnvelopeError::Expired { age_secs }.rejected());
        }
        Ok(())
    }
}

/// Build the authenticated-but-not-transmitted context for `name`.
pub(crate) fn bound_context(name: &str, issued_at: u64) -> Result<BytesMut, EnvelopeError> {
    let name_len = u16::try_from(name.len()).map_err(|_| EnvelopeError::NameTooLong)?;
    let mut ctx =
        BytesMut::with_capacity(PROTOCOL_LABEL.len() + 1 + 2 + name.len() + TIMESTAMP_LEN);
    ctx.put_slice(PROTOCOL_LABEL);
    ctx.put_u8(VERSION);
    ctx.put_u16(name_len);
    ctx.put_slice(name.as_bytes());
    ctx.put_u64(issued_at);
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;

    fn clock_at(now: u64) -> MockClock {
        let mut clock = MockClock::new();
        clock.expect_now_unix().return_const(now);
        clock
    }

    fn opened(issued_at: u64) -> Opened {
        Opened {
            issued_at,
            payload: b"x".to_vec(),
        }
    }

    #[test]
    fn context_binds_name_length() {
        // "ab" + ts and "a" + "b"-prefixed ts must never collide.
        let a = bound_context("ab", 1).unwrap();
        let b = bound_context("a", 1).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), PROTOCOL_LABEL.len() + 1 + 2 + 2 + TIMESTAMP_LEN);
    }

    #[test]
    fn context_rejects_huge_name() {
        let name = "n".repeat(usize::from(u16::MAX) + 1);
        assert_eq!(bound_context(&name, 0), Err(EnvelopeError::NameTooLong));
    }

    #[test]
    fn fresh_within_max_age() {
        let clock = clock_at(10_000);
        assert!(opened(10_000 - 3600)
            .ensure_fresh(Duration::from_secs(3600), &clock)
            .is_ok());
    }

    #[test]
    fn stale_is_invalid() {
        let clock = clock_at(10_000);
        assert_eq!(
            opened(10_000 - 3601).ensure_fresh(Duration::from_secs(3600), &clock),
            Err(CookieError::InvalidValue)
        );
    }

    #[test]
    fn skew_tolerated_but_far_future_rejected() {
        let clock = clock_at(10_000);
        let max_age = Duration::from_secs(3600);
        assert!(opened(10_060).ensure_fresh(max_age, &clock).is_ok());
        assert_eq!(
            opened(10_061).ensure_fresh(max_age, &clock),
            Err(CookieError::InvalidValue)
        );
    }
}
