//! Boundary error taxonomy shared by the codec and the HTTP service.

use thiserror::Error;

/// Every failure a cookie read or write can surface to its caller.
///
/// Variants map to HTTP status codes returned to clients:
/// - [`CookieError::NotFound`] → 400
/// - [`CookieError::InvalidValue`] → 400
/// - [`CookieError::ValueTooLong`] → 500
/// - [`CookieError::Internal`] → 500
///
/// Integrity failures, decryption failures, malformed envelopes and malformed
/// records all collapse into [`CookieError::InvalidValue`] so a client cannot
/// tell which check rejected its cookie.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CookieError {
    /// No cookie with the requested name was present in the request.
    #[error("cookie not found")]
    NotFound,

    /// The fully serialized cookie would exceed the 4096-byte browser limit.
    #[error("cookie value too long")]
    ValueTooLong,

    /// The cookie was present but could not be decoded, verified or parsed.
    #[error("invalid cookie value")]
    InvalidValue,

    /// A write-path failure that should not happen under correct configuration.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CookieError {
    /// Returns the HTTP status code that should be sent for this error.
    ///
    /// An oversized cookie is only ever produced by the server's own write
    /// path, so it is reported as a server error.
    pub fn http_status(&self) -> u16 {
        match self {
            CookieError::NotFound | CookieError::InvalidValue => 400,
            CookieError::ValueTooLong | CookieError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            CookieError::NotFound => "cookie_not_found",
            CookieError::InvalidValue => "invalid_cookie",
            CookieError::ValueTooLong | CookieError::Internal(_) => "internal_error",
        }
    }

    /// Message that is safe to echo to a client. Never carries internal detail.
    pub fn client_message(&self) -> &'static str {
        match self {
            CookieError::NotFound => "cookie not found",
            CookieError::InvalidValue => "invalid cookie",
            CookieError::ValueTooLong | CookieError::Internal(_) => "server error",
        }
    }
}
