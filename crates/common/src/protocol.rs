//! Response types returned by the cookie service.
//!
//! All bodies are serialised as JSON.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Cookie endpoints
// ---------------------------------------------------------------------------

/// Body returned by every `/*/set` endpoint once the `Set-Cookie` header is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieSetResponse {
    /// Name of the cookie that was written.
    pub cookie: String,
    /// Protection mode applied: `"plain"`, `"signed"` or `"encrypted"`.
    pub mode: String,
}

/// Body returned by `/plain/get` and `/signed/get`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieValueResponse {
    /// The decoded cookie value, as UTF-8 text.
    pub value: String,
}

/// Body returned by `/encrypted/get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub name: String,
    pub age: i64,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"invalid_cookie"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::CookieError> for ErrorResponse {
    fn from(err: &crate::CookieError) -> Self {
        Self::new(err.code(), err.client_message())
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Crate version of the running service.
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CookieError;

    #[test]
    fn error_response_from_cookie_error() {
        let e = ErrorResponse::from(&CookieError::InvalidValue);
        assert_eq!(e.code, "invalid_cookie");
        assert_eq!(e.message, "invalid cookie");
    }

    #[test]
    fn internal_error_response_is_generic() {
        let e = ErrorResponse::from(&CookieError::Internal("nonce generation failed".into()));
        assert_eq!(e.message, "server error");
        assert!(!e.message.contains("nonce"));
    }

    #[test]
    fn user_response_serde() {
        let json = serde_json::to_string(&UserResponse {
            name: "Alice".into(),
            age: 21,
        })
        .unwrap();
        assert_eq!(json, r#"{"name":"Alice","age":21}"#);
        let decoded: UserResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.age, 21);
    }
}
