//! `cookie-svc`: HTTP service binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (OTEL + tracing).
//! 3. Derive the cookie [`Secret`] from `SECRET_KEY`.
//! 4. Build the Axum router and start the HTTP server.

mod config;
mod server;
mod telemetry;
mod user;

use std::sync::Arc;

use anyhow::{Context, Result};
use cookie_codec::Secret;
use tracing::info;

use config::Config;
use server::state::{AppState, CookieSettings};

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = cfg.listen_port,
        cookie = %cfg.cookie_name,
        enforce_max_age = cfg.enforce_max_age,
        "cookie-svc starting"
    );

    // -----------------------------------------------------------------------
    // 3. Secret
    // -----------------------------------------------------------------------
    let secret = Secret::from_hex(&cfg.secret_key).context("SECRET_KEY is not a usable secret")?;

    // -----------------------------------------------------------------------
    // 4. HTTP server
    // -----------------------------------------------------------------------
    let state = AppState::new(Arc::new(secret), CookieSettings::from(&cfg));
    let router = server::router::build(state);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
