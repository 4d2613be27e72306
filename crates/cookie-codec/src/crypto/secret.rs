//! [`Secret`]: the process-wide cookie key and its derived sub-keys.

use hkdf::Hkdf;
use sha2::Sha256;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{KEY_LEN, PROTOCOL_LABEL};

const ENCRYPT_INFO: &[u8] = b"cookie-codec/v1/encrypt";
const SIGN_INFO: &[u8] = b"cookie-codec/v1/sign";

/// Errors produced while loading the secret.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SecretError {
    /// The configured value is not valid hexadecimal.
    #[error("secret is not valid hex")]
    InvalidHex,

    /// The decoded key material has the wrong length.
    #[error("secret has invalid length: expected {KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),

    /// HKDF refused to expand a sub-key.
    #[error("sub-key derivation failed")]
    Derivation,
}

/// The shared cookie secret.
///
/// Built once at startup and then only read. The master key is not kept:
/// only the two HKDF-SHA256 sub-keys derived from it are stored, so the
/// signing key can never double as the encryption key. Both are wiped when
/// the value is dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Secret {
    encrypt_key: [u8; KEY_LEN],
    sign_key: [u8; KEY_LEN],
}

impl Secret {
    /// Parse a hex-encoded [`KEY_LEN`]-byte secret.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidHex`] or [`SecretError::InvalidLength`].
    pub fn from_hex(hex_str: &str) -> Result<Self, SecretError> {
        let mut raw = hex::decode(hex_str.trim()).map_err(|_| SecretError::InvalidHex)?;
        let secret = Self::from_bytes(&raw);
        raw.zeroize();
        secret
    }

    /// Build a secret from raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidLength`] if `master` is not [`KEY_LEN`] bytes.
    pub fn from_bytes(master: &[u8]) -> Result<Self, SecretError> {
        if master.len() != KEY_LEN {
            return Err(SecretError::InvalidLength(master.len()));
        }
        let hk = Hkdf::<Sha256>::new(Some(PROTOCOL_LABEL), master);
        let mut secret = Self {
            encrypt_key: [0u8; KEY_LEN],
            sign_key: [0u8; KEY_LEN],
        };
        hk.expand(ENCRYPT_INFO, &mut secret.encrypt_key)
            .map_err(|_| SecretError::Derivation)?;
        hk.expand(SIGN_INFO, &mut secret.sign_key)
            .map_err(|_| SecretError::Derivation)?;
        Ok(secret)
    }

    pub(crate) fn encrypt_key(&self) -> &[u8; KEY_LEN] {
        &self.encrypt_key
    }

    pub(crate) fn sign_key(&self) -> &[u8; KEY_LEN] {
        &self.sign_key
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.write_str("Secret([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_HEX: &str = "13d6b4dff8f84a10851021ec8608f814570d562c92fe6b5ec4c9f595bcb3234b";

    #[test]
    fn parses_hex_secret() {
        assert!(Secret::from_hex(TEST_HEX).is_ok());
        assert!(Secret::from_hex(&format!("  {TEST_HEX}\n")).is_ok());
    }

    #[test]
    fn rejects_bad_hex() {
        assert_eq!(
            Secret::from_hex("zz").unwrap_err(),
            SecretError::InvalidHex
        );
        assert_eq!(
            Secret::from_hex("abc").unwrap_err(),
            SecretError::InvalidHex
        );
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            Secret::from_hex("00112233").unwrap_err(),
            SecretError::InvalidLength(4)
        );
        assert_eq!(
            Secret::from_bytes(&[0u8; 16]).unwrap_err(),
            SecretError::InvalidLength(16)
        );
    }

    #[test]
    fn sub_keys_are_distinct_and_deterministic() {
        let a = Secret::from_hex(TEST_HEX).unwrap();
        let b = Secret::from_hex(TEST_HEX).unwrap();
        assert_ne!(a.encrypt_key(), a.sign_key());
        assert_eq!(a.encrypt_key(), b.encrypt_key());
        assert_eq!(a.sign_key(), b.sign_key());
    }

    #[test]
    fn redacted_in_debug() {
        let s = Secret::from_hex(TEST_HEX).unwrap();
        let dbg = format!("{s:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("13d6"));
    }
}
