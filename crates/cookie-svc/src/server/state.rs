//! Shared application state injected into every Axum handler.

use std::sync::Arc;
use std::time::Duration;

use cookie_codec::{Clock, CookieAttributes, CookieError, Opened, Secret, SystemClock};

use crate::config::Config;

/// Per-deployment cookie settings.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    /// Name every endpoint writes and reads.
    pub name: String,
    /// Attributes attached to every issued cookie.
    pub attributes: CookieAttributes,
    /// Reject signed/encrypted cookies older than this, when set.
    pub max_age_limit: Option<Duration>,
}

impl From<&Config> for CookieSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            name: cfg.cookie_name.clone(),
            attributes: CookieAttributes::default().with_max_age(cfg.cookie_max_age_secs),
            max_age_limit: cfg.max_age_limit(),
        }
    }
}

/// Application state shared across all request handlers.
///
/// All fields are `Arc`-wrapped so that Axum can clone the state for each
/// request without copying key material. The secret is never mutated after
/// startup, so handlers read it without locking.
#[derive(Clone)]
pub struct AppState {
    pub secret: Arc<Secret>,
    pub cookie: Arc<CookieSettings>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create a new [`AppState`] backed by the system clock.
    pub fn new(secret: Arc<Secret>, cookie: CookieSettings) -> Self {
        Self {
            secret,
            cookie: Arc::new(cookie),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for age checks.
    #[cfg(test)]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Apply the configured age limit, if any, to a verified cookie.
    pub fn check_fresh(&self, opened: &Opened) -> Result<(), CookieError> {
        match self.cookie.max_age_limit {
            Some(max_age) => opened.ensure_fresh(max_age, &*self.clock),
            None => Ok(()),
        }
    }
}
