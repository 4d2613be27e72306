//! Logging and optional OpenTelemetry span export.
//!
//! Logs are structured JSON on stdout. When `OTEL_EXPORTER_OTLP_ENDPOINT` is
//! set, spans are additionally exported over OTLP/gRPC.
//!
//! # Telemetry invariants
//!
//! - **No secret, cookie value or decoded payload** may appear in any span
//!   attribute or log field. Cookie names and error kinds are fine.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`), overridden
//!   by `RUST_LOG` when present.

pub mod init;

pub use init::init_telemetry;
