//! Auth router composition.

use crate::dispatcher::AuthDispatcher;
use crate::handlers::endpoint::auth_endpoint;
use crate::providers::AuthHandler;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;

/// Create the auth endpoint router.
///
/// # Routes
///
/// - `GET|POST /` - no action, delegated as-is
/// - `GET|POST /*nextauth` - any action; `signin` and `callback` drive the
///   mobile redirect flow
///
/// Cookie handling is layered in here, so the router can be nested anywhere.
///
/// A nested router never sees `<mount>/` with the trailing slash; trim
/// trailing slashes around the outer router to serve it.
///
/// # Example
///
/// ```rust,ignore
/// let dispatcher = Arc::new(AuthDispatcher::new(UpstreamAuthService::new(url)?));
///
/// let app = Router::new()
///     .nest("/api/auth", auth_router(dispatcher))
///     .layer(TraceLayer::new_for_http());
/// ```
pub fn auth_router<H>(dispatcher: Arc<AuthDispatcher<H>>) -> Router
where
    H: AuthHandler + 'static,
{
    Router::new()
        .route("/", get(auth_endpoint::<H>).post(auth_endpoint::<H>))
        .route("/*nextauth", get(auth_endpoint::<H>).post(auth_endpoint::<H>))
        .layer(CookieManagerLayer::new())
        .with_state(dispatcher)
}
