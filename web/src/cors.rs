//! Permissive cross-origin headers.
//!
//! The RPC endpoint is called from mobile clients and from other origins
//! during development, so it answers every preflight with a wildcard policy
//! and stamps `Access-Control-Allow-Origin: *` on successful responses.

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// Methods advertised by the preflight response.
pub const ALLOWED_METHODS: &str = "OPTIONS, GET, POST";

/// Header set sent in answer to a preflight request.
#[must_use]
pub fn preflight_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(4);
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_REQUEST_METHOD, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
    headers
}

/// `204 No Content` preflight response.
///
/// Independent of the request: no body, no side effects.
#[must_use]
pub fn preflight_response() -> Response {
    (StatusCode::NO_CONTENT, preflight_headers()).into_response()
}

/// Add `Access-Control-Allow-Origin: *` to an existing response.
///
/// Status, body and every other header are left untouched.
#[must_use]
pub fn allow_any_origin(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}
