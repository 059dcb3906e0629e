//! Auth handler trait.

use crate::error::Result;
use axum::{extract::Request, response::Response};
use std::future::Future;

/// The auth handler collaborator.
///
/// Owns everything about authentication proper: provider redirects,
/// credential checks, CSRF, and the session cookie it sets on its responses.
/// The bridge hands it the original request and treats the response as
/// opaque, apart from reading the session cookie on mobile callbacks.
pub trait AuthHandler: Send + Sync {
    /// Handle a `GET` on the auth endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::HandlerFailed`] if no response could be
    /// produced.
    fn get(&self, request: Request) -> impl Future<Output = Result<Response>> + Send;

    /// Handle a `POST` on the auth endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::HandlerFailed`] if no response could be
    /// produced.
    fn post(&self, request: Request) -> impl Future<Output = Result<Response>> + Send;
}
