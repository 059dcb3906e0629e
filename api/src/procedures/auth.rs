//! `auth.*` procedures.

use crate::context::RpcContext;
use crate::error::Result;
use acme_auth::{Session, SessionStore};
use serde::Serialize;

/// Message returned by `auth.getSecretMessage`.
pub const SECRET_MESSAGE: &str = "you can see this secret message!";

/// Output of `auth.signOut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignOutResult {
    /// `false` when there was no token to invalidate.
    pub success: bool,
}

/// `auth.getSession`: the caller's session, if signed in.
#[must_use]
pub fn get_session<P, S>(ctx: &RpcContext<P, S>) -> Option<Session> {
    ctx.session.clone()
}

/// `auth.getSecretMessage`.
#[must_use]
pub const fn get_secret_message() -> &'static str {
    SECRET_MESSAGE
}

/// `auth.signOut`: invalidate the token the request came with.
///
/// # Errors
///
/// Propagates session store failures.
pub async fn sign_out<P, S: SessionStore>(ctx: &RpcContext<P, S>) -> Result<SignOutResult> {
    let Some(token) = &ctx.token else {
        return Ok(SignOutResult { success: false });
    };

    ctx.sessions.invalidate_token(token).await?;
    tracing::info!(
        user = ctx.session.as_ref().map_or("unknown", |s| s.user.id.0.as_str()),
        "Signed out"
    );
    Ok(SignOutResult { success: true })
}
