//! # Acme Auth Bridge
//!
//! Fronts the auth endpoint (`/api/auth/*`) of a session-based auth service
//! and adds one thing to it: mobile sign-in redirects.
//!
//! A mobile (Expo) client cannot read the session cookie the web flow sets.
//! Instead it opens the sign-in page with `expo-redirect=<callback url>`; the
//! bridge parks that URL in a redirect marker, lets the auth handler run the
//! provider flow, and on the callback sends the client back to its URL with
//! the new session token as the `session_token` query parameter.
//!
//! ## Architecture
//!
//! ```text
//! request ─► auth_router ─► AuthDispatcher ─► AuthHandler (collaborator)
//!                               │
//!                               └─► MarkerStore (cookie jar or keyed store)
//! ```
//!
//! Everything that is not part of the mobile redirect flow is passed to the
//! auth handler untouched and its response returned verbatim.
//!
//! ## Example
//!
//! ```rust,ignore
//! use acme_auth::{auth_router, AuthDispatcher, MobileRedirectConfig, UpstreamAuthService};
//! use std::sync::Arc;
//!
//! let upstream = UpstreamAuthService::new("http://127.0.0.1:3001")?;
//! let dispatcher = AuthDispatcher::new(upstream).with_config(MobileRedirectConfig::default());
//!
//! let app = axum::Router::new().nest("/api/auth", auth_router(Arc::new(dispatcher)));
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod clock;
pub mod config;
pub mod constants;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod marker;
pub mod providers;
pub mod route;
pub mod router;
pub mod session_token;
pub mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use clock::{Clock, SystemClock};
pub use config::MobileRedirectConfig;
pub use dispatcher::AuthDispatcher;
pub use error::{AuthError, Result};
pub use marker::{
    CallbackOutcome, ClientKey, CookieMarkerStore, InMemoryMarkerStore, MarkerStore,
    RedirectMarker, RedirectState,
};
pub use providers::{AuthHandler, SessionStore, UpstreamAuthService};
pub use route::AuthRoute;
pub use router::auth_router;
pub use session_token::{extract_session_token, session_token_from_request, SessionToken};
pub use state::{Session, SessionUser, UserId};
