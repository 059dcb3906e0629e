//! Error types for the auth bridge.

use acme_web::AppError;
use thiserror::Error;

/// Result type alias for auth bridge operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Failures surfaced by the auth bridge.
///
/// The dispatcher never recovers from these; they propagate to the route
/// handler and are rendered by [`AppError`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The delegated auth handler failed to produce a response.
    #[error("Auth handler failed: {0}")]
    HandlerFailed(String),

    /// The upstream auth service answered with something unusable.
    #[error("Invalid upstream response: {0}")]
    InvalidUpstreamResponse(String),

    /// The request could not be forwarded.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The redirect marker store could not be read or written.
    #[error("Redirect marker store failed: {0}")]
    MarkerStore(String),

    /// Session lookup or invalidation failed.
    #[error("Session store failed: {0}")]
    SessionStore(String),
}

impl AuthError {
    /// Returns `true` if the failure originated in a delegated collaborator.
    ///
    /// ```
    /// # use acme_auth::AuthError;
    /// assert!(AuthError::HandlerFailed("timeout".into()).is_upstream());
    /// assert!(!AuthError::MarkerStore("poisoned".into()).is_upstream());
    /// ```
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::HandlerFailed(_) | Self::InvalidUpstreamResponse(_) | Self::SessionStore(_)
        )
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let app_error = match &err {
            AuthError::InvalidRequest(message) => Self::bad_request(message.clone()),
            AuthError::HandlerFailed(_)
            | AuthError::InvalidUpstreamResponse(_)
            | AuthError::SessionStore(_) => Self::internal("Authentication service failed"),
            AuthError::MarkerStore(_) => Self::internal("An internal error occurred"),
        };
        app_error.with_source(err)
    }
}
