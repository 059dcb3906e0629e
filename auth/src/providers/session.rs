//! Session store trait.

use crate::error::Result;
use crate::session_token::SessionToken;
use crate::state::Session;
use std::future::Future;

/// Session lookup and invalidation by token.
///
/// # Implementation Notes
///
/// - Tokens come from the `Authorization` header (mobile) or the session
///   cookie (web); the store does not care which.
/// - An unknown or expired token is `Ok(None)`, not an error.
pub trait SessionStore: Send + Sync {
    /// Resolve a token to its session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::SessionStore`] if the backing service fails.
    fn validate_token(
        &self,
        token: &SessionToken,
    ) -> impl Future<Output = Result<Option<Session>>> + Send;

    /// Invalidate a token so later lookups fail.
    ///
    /// Invalidating an unknown token succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::SessionStore`] if the backing service fails.
    fn invalidate_token(&self, token: &SessionToken) -> impl Future<Output = Result<()>> + Send;
}
