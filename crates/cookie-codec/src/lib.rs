//! Secure value codec for HTTP cookies.
//!
//! Layers, leaf first:
//!
//! - [`transport`]: base64url encoding into the cookie-value alphabet,
//!   `Set-Cookie` framing with the 4096-byte ceiling, `Cookie` header lookup.
//! - [`crypto`]: the [`Secret`], AES-256-GCM-SIV sealed envelopes and
//!   HMAC-SHA256 signed values, both bound to the cookie name and an issue
//!   timestamp.
//! - [`record`]: a self-describing field-list serializer for structured payloads.
//! - [`cookies`]: the write/read entry points combining the above.
//!
//! Every operation is a pure, synchronous function of its inputs. The only
//! shared state is the [`Secret`], which is read-only after construction and
//! can be shared across threads behind an `Arc` without locking.
//!
//! ```
//! use cookie_codec::{cookies, CookieAttributes, Secret};
//!
//! let secret = Secret::from_hex(
//!     "13d6b4dff8f84a10851021ec8608f814570d562c92fe6b5ec4c9f595bcb3234b",
//! ).unwrap();
//! let set_cookie = cookies::write_encrypted(
//!     "exampleCookie",
//!     b"Hello world!",
//!     &CookieAttributes::default(),
//!     &secret,
//! ).unwrap();
//!
//! // The browser sends back only `name=value`.
//! let header = set_cookie.split(';').next().unwrap();
//! let opened = cookies::read_encrypted(header, "exampleCookie", &secret).unwrap();
//! assert_eq!(opened.payload, b"Hello world!");
//! ```

pub mod clock;
pub mod cookies;
pub mod crypto;
pub mod record;
pub mod transport;

pub use clock::{Clock, SystemClock};
pub use common::CookieError;
pub use crypto::{Opened, Secret, SecretError};
pub use record::{CookieRecord, FieldValue, Record, RecordError};
pub use transport::{CookieAttributes, SameSite, MAX_COOKIE_LEN};
