//! Configuration loading and validation for the cookie service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use std::time::Duration;

use anyhow::{Context, Result};
use cookie_codec::transport::is_valid_name;
use serde::Deserialize;

/// Validated cookie service configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Hex-encoded 32-byte cookie secret. **Required.**
    pub secret_key: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Name under which every endpoint writes and reads its cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// `Max-Age` attribute, in seconds, of issued cookies.
    #[serde(default = "default_cookie_max_age")]
    pub cookie_max_age_secs: u64,

    /// Also reject signed and encrypted cookies older than `cookie_max_age_secs`.
    #[serde(default)]
    pub enforce_max_age: bool,

    /// OTLP endpoint for span export. JSON logs only when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_port() -> u16 {
    3000
}
fn default_cookie_name() -> String {
    "exampleCookie".into()
}
fn default_cookie_max_age() -> u64 {
    3600
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Age limit applied to incoming cookies, if enforcement is on.
    pub fn max_age_limit(&self) -> Option<Duration> {
        self.enforce_max_age
            .then(|| Duration::from_secs(self.cookie_max_age_secs))
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.secret_key.trim().is_empty() {
            anyhow::bail!("SECRET_KEY is required and must not be empty");
        }
        if !is_valid_name(&self.cookie_name) {
            anyhow::bail!("COOKIE_NAME must be a non-empty RFC 6265 token");
        }
        if self.enforce_max_age && self.cookie_max_age_secs == 0 {
            anyhow::bail!("COOKIE_MAX_AGE_SECS must be > 0 when ENFORCE_MAX_AGE is set");
        }
        Ok(())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("secret_key", &"[REDACTED]")
            .field("listen_port", &self.listen_port)
            .field("cookie_name", &self.cookie_name)
            .field("cookie_max_age_secs", &self.cookie_max_age_secs)
            .field("enforce_max_age", &self.enforce_max_age)
            .field("otel_exporter_otlp_endpoint", &self.otel_exporter_otlp_endpoint)
            .field("log_level", &self.log_level)
            .finish()
    }
}
