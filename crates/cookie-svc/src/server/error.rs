//! HTTP mapping for handler errors.

use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{protocol::ErrorResponse, CookieError};
use thiserror::Error;
use tracing::{debug, error, warn};

/// Handler error rendered as a JSON [`ErrorResponse`].
///
/// Only the generic client message is sent; internal detail goes to the log.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Cookie(#[from] CookieError),

    #[error("invalid query string: {0}")]
    Query(#[from] QueryRejection),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Cookie(err) => {
                match err {
                    CookieError::NotFound => debug!("cookie not found"),
                    CookieError::InvalidValue => debug!("rejected invalid cookie"),
                    CookieError::ValueTooLong => warn!("cookie exceeds 4096 bytes; not written"),
                    CookieError::Internal(detail) => {
                        error!(error = %detail, "cookie operation failed")
                    }
                }
                let status = StatusCode::from_u16(err.http_status())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, ErrorResponse::from(err))
            }
            ApiError::Query(rejection) => {
                debug!(error = %rejection, "rejected query string");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("invalid_query", "invalid query string"),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
