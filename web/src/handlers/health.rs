//! Liveness endpoint.
//!
//! Used by load balancers to check that the process is serving requests.
//! It does not probe the auth handler or the RPC router.

use axum::http::StatusCode;

/// `GET /health`, always `200 ok`.
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}
