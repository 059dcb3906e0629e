//! # Acme Server
//!
//! Hosts the auth bridge and the RPC endpoint behind one listener.
//!
//! The auth service itself runs elsewhere; [`UpstreamAuthService`] reaches it
//! over HTTP both as the auth handler behind `/api/auth/*` and as the session
//! store the RPC procedures consult.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod routes;

pub use config::Config;
pub use routes::{build_router, normalize_trailing_slash, AUTH_ENDPOINT};

use acme_api::{InMemoryPostRepository, TransportState};
use acme_auth::constants::REDIRECT_MARKER_TTL_SECS;
use acme_auth::{AuthDispatcher, MobileRedirectConfig, UpstreamAuthService};
use axum::Router;
use chrono::Duration;
use std::sync::Arc;
use tower_http::normalize_path::NormalizePath;

/// Wire the production collaborators from `config`.
///
/// # Errors
///
/// Returns an error if the auth service client cannot be built.
pub fn build_app(config: &Config) -> anyhow::Result<NormalizePath<Router>> {
    let upstream =
        UpstreamAuthService::new(&config.auth.url)?.with_secure_cookies(config.auth.secure_cookies);

    let redirect_config = MobileRedirectConfig::new()
        .with_marker_ttl(marker_ttl(config.auth.marker_ttl))
        .with_secure_cookies(config.auth.secure_cookies);

    let sessions = Arc::new(upstream.clone());
    let dispatcher = AuthDispatcher::new(upstream).with_config(redirect_config);

    let rpc = TransportState::new(Arc::new(InMemoryPostRepository::new()), sessions)
        .with_endpoint(config.trpc_endpoint.clone());

    Ok(normalize_trailing_slash(build_router(
        Arc::new(dispatcher),
        Arc::new(rpc),
    )))
}

/// Marker lifetime from seconds. Values `chrono` cannot represent fall back
/// to the default.
fn marker_ttl(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .or_else(|| Duration::try_seconds(REDIRECT_MARKER_TTL_SECS))
        .unwrap_or_default()
}
