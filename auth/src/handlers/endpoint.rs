//! Catch-all handler for `/api/auth/*`.

use crate::dispatcher::AuthDispatcher;
use crate::marker::CookieMarkerStore;
use crate::providers::AuthHandler;
use crate::route::AuthRoute;
use acme_web::{AppError, ClientIp, CorrelationId};
use axum::{
    extract::{Path, Request, State},
    response::Response,
};
use std::sync::Arc;
use tower_cookies::Cookies;

/// Handle `GET` or `POST` on the auth endpoint.
///
/// # Endpoint
///
/// ```text
/// GET  /api/auth/signin/github?expo-redirect=exp%3A%2F%2F192.168.1.2%3A8081
/// GET  /api/auth/callback/github?code=..&state=..
/// POST /api/auth/signout
/// ```
///
/// # Response
///
/// The auth handler's response, or a `307` to the mobile callback URL when a
/// mobile sign-in completes.
///
/// # Errors
///
/// Returns 500 if the auth handler fails.
pub async fn auth_endpoint<H>(
    State(dispatcher): State<Arc<AuthDispatcher<H>>>,
    correlation_id: CorrelationId,
    client_ip: ClientIp,
    cookies: Cookies,
    action: Option<Path<String>>,
    request: Request,
) -> Result<Response, AppError>
where
    H: AuthHandler + 'static,
{
    let route = action.map_or_else(
        || AuthRoute::Other(String::new()),
        |Path(rest)| AuthRoute::from_path(&rest),
    );

    tracing::debug!(
        correlation_id = %correlation_id.0,
        client_ip = %client_ip.0,
        method = %request.method(),
        action = %route,
        "Auth endpoint request"
    );

    let markers = CookieMarkerStore::new(cookies, dispatcher.config().clone());

    dispatcher
        .dispatch(request, &route, &markers)
        .await
        .map_err(|e| {
            tracing::error!(
                correlation_id = %correlation_id.0,
                action = %route,
                error = %e,
                "Auth endpoint failed"
            );
            AppError::from(e)
        })
}
