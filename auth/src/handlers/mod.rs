//! HTTP handlers for the auth endpoint.
//!
//! Handlers decode the action, build the request-scoped marker store and hand
//! the untouched request to the [`crate::AuthDispatcher`].

pub mod endpoint;
