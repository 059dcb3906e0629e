//! Per-request RPC context.
//!
//! Mobile clients send their session token as a bearer token; the web app
//! relies on the session cookie. Either way the token is resolved through the
//! session store once per request, before any procedure runs.

use crate::error::Result;
use acme_auth::constants::SESSION_TOKEN_COOKIE;
use acme_auth::{session_token_from_request, Session, SessionStore, SessionToken};
use axum::http::{header, HeaderMap};
use std::sync::Arc;

/// Header naming the calling client (`nextjs-react`, `expo-react`, ...).
pub const SOURCE_HEADER: &str = "x-trpc-source";

/// Everything a procedure can see about the request.
pub struct RpcContext<P, S> {
    /// Resolved session, `None` when signed out or the token is unknown.
    pub session: Option<Session>,
    /// Token the session was looked up with.
    pub token: Option<SessionToken>,
    /// Post repository.
    pub posts: Arc<P>,
    /// Session store, for sign-out.
    pub sessions: Arc<S>,
}

impl<P, S> RpcContext<P, S> {
    /// The session, if any. Used by protected procedures.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }
}

/// Bearer token from `Authorization`, else the session cookie.
#[must_use]
pub fn request_token(headers: &HeaderMap) -> Option<SessionToken> {
    bearer_token(headers).or_else(|| session_token_from_request(headers, SESSION_TOKEN_COOKIE))
}

fn bearer_token(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(SessionToken::new)
}

/// Build the context for one request.
///
/// # Errors
///
/// Returns an `INTERNAL_SERVER_ERROR` [`crate::RpcError`] if the session store
/// fails. An unknown token is not an error.
pub async fn create_context<P, S>(
    headers: HeaderMap,
    posts: Arc<P>,
    sessions: Arc<S>,
) -> Result<RpcContext<P, S>>
where
    S: SessionStore,
{
    let source = headers
        .get(SOURCE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    let token = request_token(&headers);
    let session = match &token {
        Some(token) => sessions.validate_token(token).await?,
        None => None,
    };

    tracing::debug!(
        source = %source,
        user = session.as_ref().map_or("none", |s| s.user.id.0.as_str()),
        "Received RPC request"
    );

    Ok(RpcContext {
        session,
        token,
        posts,
        sessions,
    })
}
