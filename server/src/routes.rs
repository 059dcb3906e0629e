//! Router configuration for the server.
//!
//! Builds the complete Axum router with all endpoints.

use acme_api::{trpc_router, PostRepository, TransportState};
use acme_auth::{auth_router, AuthDispatcher, AuthHandler, SessionStore};
use acme_web::{correlation_id_layer, handlers::health_check};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::normalize_path::NormalizePath;
use tower_http::trace::TraceLayer;

/// Mount path of the auth bridge.
pub const AUTH_ENDPOINT: &str = "/api/auth";

/// Build the complete Axum router.
///
/// - `GET /health` - liveness
/// - `/api/auth/*` - auth bridge, see [`auth_router`]
/// - `<endpoint>/*` - RPC endpoint at `rpc.endpoint()`, see [`trpc_router`]
///
/// Every request gets a correlation ID and a trace span.
pub fn build_router<H, P, S>(
    auth: Arc<AuthDispatcher<H>>,
    rpc: Arc<TransportState<P, S>>,
) -> Router
where
    H: AuthHandler + 'static,
    P: PostRepository + 'static,
    S: SessionStore + 'static,
{
    let rpc_endpoint = rpc.endpoint().to_string();

    Router::new()
        .route("/health", get(health_check))
        .nest(AUTH_ENDPOINT, auth_router(auth))
        .nest(&rpc_endpoint, trpc_router(rpc))
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
}

/// Strip trailing slashes before routing, so `/api/auth/` reaches the auth
/// endpoint like `/api/auth`.
///
/// Must wrap the whole router: layers added with [`Router::layer`] run after
/// the route was matched.
pub fn normalize_trailing_slash(router: Router) -> NormalizePath<Router> {
    NormalizePath::trim_trailing_slash(router)
}
