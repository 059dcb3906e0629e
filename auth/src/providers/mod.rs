//! Collaborator interfaces.
//!
//! The auth bridge does not authenticate anyone itself. It delegates to an
//! auth handler (which owns providers, credentials and session cookies) and
//! reads sessions through a session store. Both are traits so the bridge can
//! be exercised with in-memory mocks:
//!
//! - **Testing**: [`crate::mocks`] (deterministic, records calls)
//! - **Production**: [`UpstreamAuthService`] (forwards to the auth service over HTTP)

pub mod auth_handler;
pub mod session;
pub mod upstream;

// Re-export provider traits
pub use auth_handler::AuthHandler;
pub use session::SessionStore;
pub use upstream::UpstreamAuthService;
