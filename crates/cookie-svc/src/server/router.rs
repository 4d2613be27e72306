//! Axum router construction.

use axum::{routing::get, Router};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/plain/set", get(handlers::set_plain))
        .route("/plain/get", get(handlers::get_plain))
        .route("/signed/set", get(handlers::set_signed))
        .route("/signed/get", get(handlers::get_signed))
        .route("/encrypted/set", get(handlers::set_encrypted))
        .route("/encrypted/get", get(handlers::get_encrypted))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(middleware::REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .with_state(state)
}
