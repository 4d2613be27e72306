//! Axum request handlers for all service endpoints.
//!
//! Each protection mode has a `set` endpoint that writes the configured
//! cookie and a `get` endpoint that reads it back from the request.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use common::protocol::{
    CookieSetResponse, CookieValueResponse, ErrorResponse, HealthResponse, UserResponse,
};
use cookie_codec::{cookies, CookieError};
use serde::Deserialize;
use tracing::info;

use super::{error::ApiError, state::AppState};
use crate::user::User;

const DEFAULT_PLAIN_VALUE: &str = "Hello Zoë!";
const DEFAULT_SIGNED_VALUE: &str = "Hello world!";

/// Query string accepted by `/plain/set` and `/signed/set`.
#[derive(Debug, Default, Deserialize)]
pub struct ValueParams {
    pub value: Option<String>,
}

/// Query string accepted by `/encrypted/set`.
#[derive(Debug, Default, Deserialize)]
pub struct UserParams {
    pub name: Option<String>,
    pub age: Option<i64>,
}

/// `GET /plain/set`: write an unprotected, base64url-encoded cookie.
pub async fn set_plain(
    State(state): State<AppState>,
    query: Result<Query<ValueParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = query?;
    let value = params.value.unwrap_or_else(|| DEFAULT_PLAIN_VALUE.into());
    let set_cookie =
        cookies::write_plain(&state.cookie.name, value.as_bytes(), &state.cookie.attributes)?;
    cookie_written(set_cookie, &state, "plain")
}

/// `GET /plain/get`: echo the decoded plain cookie.
pub async fn get_plain(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CookieValueResponse>, ApiError> {
    let raw = cookies::read_plain(&cookie_header(&headers), &state.cookie.name)?;
    Ok(Json(CookieValueResponse { value: utf8(raw)? }))
}

/// `GET /signed/set`: write a tamper-evident cookie.
pub async fn set_signed(
    State(state): State<AppState>,
    query: Result<Query<ValueParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = query?;
    let value = params.value.unwrap_or_else(|| DEFAULT_SIGNED_VALUE.into());
    let set_cookie = cookies::write_signed(
        &state.cookie.name,
        value.as_bytes(),
        &state.cookie.attributes,
        &state.secret,
    )?;
    cookie_written(set_cookie, &state, "signed")
}

/// `GET /signed/get`: verify the signed cookie and echo its value.
pub async fn get_signed(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CookieValueResponse>, ApiError> {
    let opened = cookies::read_signed(&cookie_header(&headers), &state.cookie.name, &state.secret)?;
    state.check_fresh(&opened)?;
    Ok(Json(CookieValueResponse {
        value: utf8(opened.payload)?,
    }))
}

/// `GET /encrypted/set`: write an encrypted [`User`] record.
///
/// Defaults to `{ Name: "Alice", Age: 21 }`.
pub async fn set_encrypted(
    State(state): State<AppState>,
    query: Result<Query<UserParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = query?;
    let defaults = User::default();
    let user = User {
        name: params.name.unwrap_or(defaults.name),
        age: params.age.unwrap_or(defaults.age),
    };
    let set_cookie = cookies::write_encrypted_record(
        &state.cookie.name,
        &user,
        &state.cookie.attributes,
        &state.secret,
    )?;
    cookie_written(set_cookie, &state, "encrypted")
}

/// `GET /encrypted/get`: decrypt the [`User`] record and return its fields.
pub async fn get_encrypted(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, ApiError> {
    let opened =
        cookies::read_encrypted(&cookie_header(&headers), &state.cookie.name, &state.secret)?;
    state.check_fresh(&opened)?;
    let user: User = opened.decode_record()?;
    Ok(Json(user.into()))
}

/// `GET /health`: liveness check.
///
/// The secret is loaded before the listener binds, so a running service is
/// always ready.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Join every `Cookie` request header into one `a=1; b=2` string.
///
/// Header bytes are decoded lossily so that a non-ASCII pair only spoils
/// itself, not the other cookies sharing its line.
fn cookie_header(headers: &HeaderMap) -> String {
    headers
        .get_all(header::COOKIE)
        .iter()
        .map(|v| String::from_utf8_lossy(v.as_bytes()))
        .collect::<Vec<_>>()
        .join("; ")
}

fn cookie_written(set_cookie: String, state: &AppState, mode: &str) -> Result<Response, ApiError> {
    let value = HeaderValue::from_str(&set_cookie)
        .map_err(|e| CookieError::Internal(format!("Set-Cookie header rejected: {e}")))?;
    info!(cookie = %state.cookie.name, mode, "cookie set");
    let body = CookieSetResponse {
        cookie: state.cookie.name.clone(),
        mode: mode.into(),
    };
    Ok(([(header::SET_COOKIE, value)], Json(body)).into_response())
}

fn utf8(raw: Vec<u8>) -> Result<String, CookieError> {
    String::from_utf8(raw).map_err(|_| CookieError::InvalidValue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::state::CookieSettings;
    use axum::{body::Body, http::Request, routing::get, Router};
    use cookie_codec::{Clock, CookieAttributes, Secret};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    const TEST_HEX: &str = "13d6b4dff8f84a10851021ec8608f814570d562c92fe6b5ec4c9f595bcb3234b";

    mockall::mock! {
        pub TestClock {}
        impl Clock for TestClock {
            fn now_unix(&self) -> u64;
        }
    }

    fn settings() -> CookieSettings {
        CookieSettings {
            name: "exampleCookie".into(),
            attributes: CookieAttributes::default(),
            max_age_limit: None,
        }
    }

    fn test_state() -> AppState {
        AppState::new(Arc::new(Secret::from_hex(TEST_HEX).unwrap()), settings())
    }

    fn test_router(state: AppState) -> Router {
        Router::new()
            .route("/plain/set", get(set_plain))
            .route("/plain/get", get(get_plain))
            .route("/signed/set", get(set_signed))
            .route("/signed/get", get(get_signed))
            .route("/encrypted/set", get(set_encrypted))
            .route("/encrypted/get", get(get_encrypted))
            .with_state(state)
    }

    async fn call(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
        let mut req = Request::builder().uri(uri);
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        app.clone()
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(resp: Response) -> T {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Issue a cookie via `set_uri` and return the `name=value` pair a browser would echo.
    async fn issue(app: &Router, set_uri: &str) -> String {
        let resp = call(app, set_uri, None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let set_cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.contains("HttpOnly; Secure; SameSite=Lax"));
        set_cookie.split(';').next().unwrap().to_owned()
    }

    #[tokio::test]
    async fn plain_round_trip() {
        let app = test_router(test_state());
        let cookie = issue(&app, "/plain/set").await;
        let resp = call(&app, "/plain/get", Some(&cookie)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: CookieValueResponse = body_json(resp).await;
        assert_eq!(body.value, "Hello Zoë!");
    }

    #[tokio::test]
    async fn signed_round_trip() {
        let app = test_router(test_state());
        let cookie = issue(&app, "/signed/set").await;
        let resp = call(&app, "/signed/get", Some(&cookie)).await;
        let body: CookieValueResponse = body_json(resp).await;
        assert_eq!(body.value, "Hello world!");
    }

    #[tokio::test]
    async fn encrypted_round_trip_alice() {
        let app = test_router(test_state());
        let cookie = issue(&app, "/encrypted/set").await;
        let resp = call(&app, "/encrypted/get", Some(&cookie)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let user: UserResponse = body_json(resp).await;
        assert_eq!(
            user,
            UserResponse {
                name: "Alice".into(),
                age: 21
            }
        );
    }

    #[tokio::test]
    async fn encrypted_set_accepts_query() {
        let app = test_router(test_state());
        let cookie = issue(&app, "/encrypted/set?name=Bob&age=42").await;
        let user: UserResponse = body_json(call(&app, "/encrypted/get", Some(&cookie)).await).await;
        assert_eq!(user.name, "Bob");
        assert_eq!(user.age, 42);
    }

    #[tokio::test]
    async fn missing_cookie_is_400_not_found() {
        let app = test_router(test_state());
        let resp = call(&app, "/encrypted/get", Some("theme=dark")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let err: ErrorResponse = body_json(resp).await;
        assert_eq!(err.code, "cookie_not_found");
    }

    #[tokio::test]
    async fn tampered_cookie_is_400_invalid() {
        let app = test_router(test_state());
        let cookie = issue(&app, "/encrypted/set").await;
        let last = cookie.chars().last().unwrap();
        let replacement = if last == 'A' { 'B' } else { 'A' };
        let tampered = format!("{}{replacement}", &cookie[..cookie.len() - 1]);
        let resp = call(&app, "/encrypted/get", Some(&tampered)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let err: ErrorResponse = body_json(resp).await;
        assert_eq!(err.code, "invalid_cookie");
        assert_eq!(err.message, "invalid cookie");
    }

    #[tokio::test]
    async fn signed_cookie_is_not_an_encrypted_cookie() {
        let app = test_router(test_state());
        let cookie = issue(&app, "/signed/set").await;
        let resp = call(&app, "/encrypted/get", Some(&cookie)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oversized_value_is_500_without_cookie() {
        let app = test_router(test_state());
        let long = "x".repeat(4000);
        let resp = call(&app, &format!("/signed/set?value={long}"), None).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(resp.headers().get(header::SET_COOKIE).is_none());
        let err: ErrorResponse = body_json(resp).await;
        assert_eq!(err.message, "server error");
    }

    #[tokio::test]
    async fn stale_cookie_rejected_when_enforced() {
        let app = test_router(test_state());
        let cookie = issue(&app, "/signed/set").await;

        let mut clock = MockTestClock::new();
        clock
            .expect_now_unix()
            .returning(|| cookie_codec::SystemClock.now_unix() + 7200);
        let enforcing = AppState::new(
            Arc::new(Secret::from_hex(TEST_HEX).unwrap()),
            CookieSettings {
                max_age_limit: Some(Duration::from_secs(3600)),
                ..settings()
            },
        )
        .with_clock(Arc::new(clock));
        let app = test_router(enforcing);

        let resp = call(&app, "/signed/get", Some(&cookie)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn fresh_cookie_accepted_when_enforced() {
        let mut state = test_state();
        state.cookie = Arc::new(CookieSettings {
            max_age_limit: Some(Duration::from_secs(3600)),
            ..settings()
        });
        let app = test_router(state);
        let cookie = issue(&app, "/encrypted/set").await;
        let resp = call(&app, "/encrypted/get", Some(&cookie)).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn non_ascii_sibling_does_not_hide_cookie() {
        let app = test_router(test_state());
        let req = Request::builder()
            .uri("/plain/get")
            .header(
                header::COOKIE,
                HeaderValue::from_bytes(b"exampleCookie=SGVsbG8; other=\xC3\xA9").unwrap(),
            )
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: CookieValueResponse = body_json(resp).await;
        assert_eq!(body.value, "Hello");
    }

    #[test]
    fn cookie_header_keeps_pairs_next_to_invalid_bytes() {
        let mut headers = HeaderMap::new();
        headers.append(
            header::COOKIE,
            HeaderValue::from_bytes(b"junk=\xFF; a=1").unwrap(),
        );
        assert_eq!(
            cookie_codec::transport::find_cookie(&cookie_header(&headers), "a").unwrap(),
            "1"
        );
    }

    #[tokio::test]
    async fn malformed_query_is_json_bad_request() {
        let app = test_router(test_state());
        let resp = call(&app, "/encrypted/set?age=abc", None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp.headers().get(header::SET_COOKIE).is_none());
        let err: ErrorResponse = body_json(resp).await;
        assert_eq!(err.code, "invalid_query");
    }

    #[test]
    fn cookie_header_joins_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("b=2; c=3"));
        assert_eq!(cookie_header(&headers), "a=1; b=2; c=3");
    }
}
