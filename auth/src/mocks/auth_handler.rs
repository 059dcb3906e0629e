//! Mock auth handler for testing.

use crate::constants::SESSION_TOKEN_COOKIE;
use crate::error::{AuthError, Result};
use crate::providers::AuthHandler;
use axum::body::Body;
use axum::extract::{OriginalUri, Request};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::Response;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// A request the mock received.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Request method.
    pub method: Method,
    /// Full request URI as the client sent it.
    pub uri: Uri,
    /// Request headers.
    pub headers: HeaderMap,
}

/// Mock auth handler.
///
/// Answers every request with the configured status, `Set-Cookie` headers and
/// body, and records what it was given.
#[derive(Debug, Clone)]
pub struct MockAuthHandler {
    status: StatusCode,
    set_cookies: Vec<String>,
    body: String,
    should_fail: bool,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockAuthHandler {
    /// Handler answering `200 OK` with no cookies.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            set_cookies: Vec::new(),
            body: "auth handler response".to_string(),
            should_fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handler that fails every request.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new()
        }
    }

    /// Set the response status.
    #[must_use]
    pub const fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Add a raw `Set-Cookie` header value to every response.
    #[must_use]
    pub fn with_set_cookie(mut self, value: impl Into<String>) -> Self {
        self.set_cookies.push(value.into());
        self
    }

    /// Set the session cookie the way the real handler does after sign-in.
    #[must_use]
    pub fn issuing_session(self, token: &str) -> Self {
        self.with_set_cookie(format!(
            "{SESSION_TOKEN_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax"
        ))
    }

    /// Set the response body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Requests received so far.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn calls(&self) -> Result<Vec<RecordedCall>> {
        Ok(self
            .calls
            .lock()
            .map_err(|_| AuthError::HandlerFailed("Mutex lock failed".to_string()))?
            .clone())
    }

    /// Number of requests received so far.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn call_count(&self) -> Result<usize> {
        Ok(self.calls()?.len())
    }

    fn respond(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        let recorded = RecordedCall {
            method: request.method().clone(),
            uri: request
                .extensions()
                .get::<OriginalUri>()
                .map_or_else(|| request.uri().clone(), |original| original.0.clone()),
            headers: request.headers().clone(),
        };
        let calls = Arc::clone(&self.calls);
        let status = self.status;
        let set_cookies = self.set_cookies.clone();
        let body = self.body.clone();
        let should_fail = self.should_fail;

        async move {
            calls
                .lock()
                .map_err(|_| AuthError::HandlerFailed("Mutex lock failed".to_string()))?
                .push(recorded);

            if should_fail {
                return Err(AuthError::HandlerFailed("mock handler failure".to_string()));
            }

            let mut response = Response::new(Body::from(body));
            *response.status_mut() = status;
            for cookie in set_cookies {
                let value = HeaderValue::from_str(&cookie)
                    .map_err(|e| AuthError::HandlerFailed(e.to_string()))?;
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Ok(response)
        }
    }
}

impl Default for MockAuthHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthHandler for MockAuthHandler {
    fn get(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        self.respond(request)
    }

    fn post(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        self.respond(request)
    }
}
