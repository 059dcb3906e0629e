//! Transport shim for `/api/trpc/*`.
//!
//! - `OPTIONS`: fixed preflight answer, see [`acme_web::cors`]
//! - `GET`/`POST`: [`fetch_request_handler`], then
//!   `Access-Control-Allow-Origin: *` on the response
//!
//! Every failure is logged with the procedure path before the adapter
//! decides whether to answer it or return it.

use crate::adapter::{fetch_request_handler, FetchHandlerOptions, RpcErrorEvent};
use crate::context::create_context;
use crate::error::TransportError;
use crate::providers::PostRepository;
use crate::router::RpcRouter;
use acme_auth::SessionStore;
use acme_web::{cors, CorrelationId};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    response::Response,
    routing::options,
    Router,
};
use std::sync::Arc;

/// Default mount path of the RPC endpoint.
pub const DEFAULT_ENDPOINT: &str = "/api/trpc";

/// Shared state of the RPC endpoint.
pub struct TransportState<P, S> {
    endpoint: String,
    router: RpcRouter,
    posts: Arc<P>,
    sessions: Arc<S>,
}

impl<P, S> TransportState<P, S> {
    /// State serving the default router at [`DEFAULT_ENDPOINT`].
    #[must_use]
    pub fn new(posts: Arc<P>, sessions: Arc<S>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            router: RpcRouter::new(),
            posts,
            sessions,
        }
    }

    /// Set the mount path. Must match where [`trpc_router`] is nested.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Replace the procedure router.
    #[must_use]
    pub fn with_router(mut self, router: RpcRouter) -> Self {
        self.router = router;
        self
    }

    /// Mount path.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Create the RPC endpoint router.
///
/// # Routes
///
/// - `OPTIONS /`, `OPTIONS /*procedure` - preflight
/// - `GET /*procedure` - queries
/// - `POST /*procedure` - mutations
///
/// # Example
///
/// ```rust,ignore
/// let state = Arc::new(TransportState::new(posts, sessions));
///
/// let app = Router::new().nest("/api/trpc", trpc_router(state));
/// ```
pub fn trpc_router<P, S>(state: Arc<TransportState<P, S>>) -> Router
where
    P: PostRepository + 'static,
    S: SessionStore + 'static,
{
    Router::new()
        .route(
            "/",
            options(preflight).get(handle::<P, S>).post(handle::<P, S>),
        )
        .route(
            "/*procedure",
            options(preflight).get(handle::<P, S>).post(handle::<P, S>),
        )
        .with_state(state)
}

/// Answer a CORS preflight.
pub async fn preflight() -> Response {
    cors::preflight_response()
}

/// Serve a query or mutation.
///
/// # Errors
///
/// Returns the adapter's [`TransportError`], rendered as 500.
pub async fn handle<P, S>(
    State(state): State<Arc<TransportState<P, S>>>,
    correlation_id: CorrelationId,
    request: Request,
) -> Result<Response, TransportError>
where
    P: PostRepository + 'static,
    S: SessionStore + 'static,
{
    let posts = Arc::clone(&state.posts);
    let sessions = Arc::clone(&state.sessions);

    let response = fetch_request_handler(FetchHandlerOptions {
        endpoint: &state.endpoint,
        router: &state.router,
        request,
        create_context: move |headers: HeaderMap| create_context(headers, posts, sessions),
        on_error: |event: &RpcErrorEvent<'_>| log_error(correlation_id, event),
    })
    .await?;

    Ok(cors::allow_any_origin(response))
}

/// Log a failure with the procedure path it belongs to.
///
/// The path is `undefined` when the failure happened before a procedure was
/// resolved.
pub fn log_error(correlation_id: CorrelationId, event: &RpcErrorEvent<'_>) {
    let path = event.path.unwrap_or("undefined");
    tracing::error!(
        correlation_id = %correlation_id.0,
        disposition = ?event.disposition,
        error = %event.error,
        ">>> tRPC Error on '{path}'"
    );
}
