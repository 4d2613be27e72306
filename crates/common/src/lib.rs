//! Error taxonomy and protocol definitions shared across the secure cookie crates.

pub mod error;
pub mod protocol;

pub use error::CookieError;
