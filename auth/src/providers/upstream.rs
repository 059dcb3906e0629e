//! Auth handler and session store backed by an external auth service.
//!
//! The service owns providers, CSRF and session cookies. Requests to the auth
//! endpoint are forwarded verbatim and its responses relayed verbatim; session
//! lookups go through its `session`, `csrf` and `signout` actions.

use crate::constants::{SECURE_COOKIE_PREFIX, SESSION_TOKEN_COOKIE};
use crate::error::{AuthError, Result};
use crate::providers::{AuthHandler, SessionStore};
use crate::session_token::SessionToken;
use crate::state::Session;
use axum::body::Body;
use axum::extract::{OriginalUri, Request};
use axum::http::{header, HeaderMap, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use cookie::Cookie;
use reqwest::{redirect, Client};
use serde::Deserialize;

/// Default mount of the auth service's endpoint.
pub const DEFAULT_AUTH_BASE_PATH: &str = "/api/auth";

/// Default request body limit when forwarding.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Hop-by-hop headers that must not be relayed.
static HOP_BY_HOP: [header::HeaderName; 4] = [
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    header::CONTENT_LENGTH,
    header::HOST,
];

#[derive(Debug, Deserialize)]
struct CsrfResponse {
    #[serde(rename = "csrfToken")]
    csrf_token: String,
}

/// Auth service reached over HTTP.
///
/// # Example
///
/// ```no_run
/// use acme_auth::providers::UpstreamAuthService;
///
/// # fn main() -> acme_auth::Result<()> {
/// let upstream = UpstreamAuthService::new("http://127.0.0.1:3001")?
///     .with_secure_cookies(true);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct UpstreamAuthService {
    /// Origin of the auth service, without a trailing slash.
    base_url: String,

    /// Path the auth endpoint is mounted at on the service.
    ///
    /// Default: `/api/auth`
    auth_base_path: String,

    /// HTTP client. Never follows redirects: they belong to the browser.
    http_client: Client,

    /// Session cookie name, `__Secure-` prefix included when applicable.
    session_cookie: String,

    /// Largest request body forwarded.
    ///
    /// Default: 1 MiB
    max_body_bytes: usize,
}

impl UpstreamAuthService {
    /// Create a client for the auth service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidRequest`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http_client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| AuthError::InvalidRequest(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_base_path: DEFAULT_AUTH_BASE_PATH.to_string(),
            http_client,
            session_cookie: SESSION_TOKEN_COOKIE.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        })
    }

    /// Set where the auth endpoint is mounted on the service.
    #[must_use]
    pub fn with_auth_base_path(mut self, path: impl Into<String>) -> Self {
        self.auth_base_path = path.into();
        self
    }

    /// Use the `__Secure-` session cookie, as the service does over HTTPS.
    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.session_cookie = if secure {
            format!("{SECURE_COOKIE_PREFIX}{SESSION_TOKEN_COOKIE}")
        } else {
            SESSION_TOKEN_COOKIE.to_string()
        };
        self
    }

    /// Set the forwarded body limit.
    #[must_use]
    pub const fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Base URL of the service.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn action_url(&self, action: &str) -> String {
        format!("{}{}/{action}", self.base_url, self.auth_base_path)
    }

    fn session_cookie_pair(&self, token: &SessionToken) -> String {
        Cookie::new(self.session_cookie.as_str(), token.as_str()).to_string()
    }

    async fn forward(&self, request: Request) -> Result<Response> {
        let (parts, body) = request.into_parts();

        let path_and_query = parts
            .extensions
            .get::<OriginalUri>()
            .map_or(&parts.uri, |original| &original.0)
            .path_and_query()
            .map_or("/", |pq| pq.as_str())
            .to_string();
        let url = format!("{}{path_and_query}", self.base_url);

        let body = axum::body::to_bytes(body, self.max_body_bytes)
            .await
            .map_err(|e| AuthError::InvalidRequest(format!("Failed to read body: {e}")))?;

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);

        tracing::debug!(method = %parts.method, url = %url, "Forwarding to auth service");

        let upstream = self
            .http_client
            .request(parts.method, &url)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| AuthError::HandlerFailed(e.to_string()))?;

        let status = upstream.status();
        let mut headers = upstream.headers().clone();
        strip_hop_by_hop(&mut headers);

        let bytes = upstream
            .bytes()
            .await
            .map_err(|e| AuthError::InvalidUpstreamResponse(e.to_string()))?;

        Ok((status, headers, Body::from(bytes)).into_response())
    }

    async fn fetch_csrf(&self) -> Result<(String, Vec<String>)> {
        let response = self
            .http_client
            .get(self.action_url("csrf"))
            .send()
            .await
            .map_err(|e| AuthError::SessionStore(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::SessionStore(format!(
                "CSRF request returned {}",
                response.status()
            )));
        }

        let cookies = cookie_pairs(response.headers());
        let csrf: CsrfResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidUpstreamResponse(e.to_string()))?;

        Ok((csrf.csrf_token, cookies))
    }
}

/// `name=value` pairs of every cookie a response sets.
fn cookie_pairs(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse(value).ok())
        .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
        .collect()
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}

/// Session endpoint body: a session, `null`, or `{}` when signed out.
fn parse_session(body: serde_json::Value) -> Result<Option<Session>> {
    match body {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(ref map) if map.is_empty() => Ok(None),
        other => serde_json::from_value(other)
            .map(Some)
            .map_err(|e| AuthError::InvalidUpstreamResponse(e.to_string())),
    }
}

impl AuthHandler for UpstreamAuthService {
    async fn get(&self, request: Request) -> Result<Response> {
        // The router serves HEAD through its GET route.
        if request.method() != Method::GET && request.method() != Method::HEAD {
            return Err(AuthError::InvalidRequest(format!(
                "Expected GET or HEAD, got {}",
                request.method()
            )));
        }
        self.forward(request).await
    }

    async fn post(&self, request: Request) -> Result<Response> {
        if request.method() != Method::POST {
            return Err(AuthError::InvalidRequest(format!(
                "Expected POST, got {}",
                request.method()
            )));
        }
        self.forward(request).await
    }
}

impl SessionStore for UpstreamAuthService {
    async fn validate_token(&self, token: &SessionToken) -> Result<Option<Session>> {
        let cookie = HeaderValue::from_str(&self.session_cookie_pair(token))
            .map_err(|e| AuthError::InvalidRequest(format!("Invalid session token: {e}")))?;

        let response = self
            .http_client
            .get(self.action_url("session"))
            .header(header::COOKIE, cookie)
            .send()
            .await
            .map_err(|e| AuthError::SessionStore(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::SessionStore(format!(
                "Session request returned {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidUpstreamResponse(e.to_string()))?;

        parse_session(body)
    }

    async fn invalidate_token(&self, token: &SessionToken) -> Result<()> {
        let (csrf_token, mut cookies) = self.fetch_csrf().await?;
        cookies.push(self.session_cookie_pair(token));

        let cookie = HeaderValue::from_str(&cookies.join("; "))
            .map_err(|e| AuthError::InvalidRequest(format!("Invalid cookie header: {e}")))?;

        let response = self
            .http_client
            .post(self.action_url("signout"))
            .header(header::COOKIE, cookie)
            .form(&[("csrfToken", csrf_token.as_str())])
            .send()
            .await
            .map_err(|e| AuthError::SessionStore(e.to_string()))?;

        // Sign-out answers with a redirect on success.
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(AuthError::SessionStore(format!(
                "Sign-out request returned {status}"
            )));
        }

        tracing::info!("Session invalidated at auth service");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_session_signed_out() {
        assert_eq!(parse_session(json!(null)).unwrap(), None);
        assert_eq!(parse_session(json!({})).unwrap(), None);
    }

    #[test]
    fn test_parse_session_signed_in() {
        let session = parse_session(json!({
            "user": { "id": "user-1", "name": "Ada" },
            "expires": "2030-01-01T00:00:00.000Z"
        }))
        .unwrap()
        .unwrap();

        assert_eq!(session.user.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_parse_session_rejects_garbage() {
        assert!(matches!(
            parse_session(json!({ "unexpected": true })),
            Err(AuthError::InvalidUpstreamResponse(_))
        ));
    }

    #[test]
    fn test_cookie_pairs() {
        let mut headers = HeaderMap::new();
        headers.append(
            header::SET_COOKIE,
            HeaderValue::from_static("authjs.csrf-token=abc%7Cdef; Path=/; HttpOnly"),
        );
        headers.append(
            header::SET_COOKIE,
            HeaderValue::from_static("authjs.callback-url=http%3A%2F%2Flocalhost; Path=/"),
        );

        assert_eq!(
            cookie_pairs(&headers),
            vec![
                "authjs.csrf-token=abc%7Cdef".to_string(),
                "authjs.callback-url=http%3A%2F%2Flocalhost".to_string()
            ]
        );
    }

    #[test]
    fn test_urls_and_cookie_names() {
        let upstream = UpstreamAuthService::new("http://auth.local/").unwrap();
        assert_eq!(upstream.base_url(), "http://auth.local");
        assert_eq!(upstream.action_url("session"), "http://auth.local/api/auth/session");
        assert_eq!(
            upstream.session_cookie_pair(&SessionToken::new("tok")),
            "authjs.session-token=tok"
        );

        let secure = upstream.with_secure_cookies(true);
        assert_eq!(
            secure.session_cookie_pair(&SessionToken::new("tok")),
            "__Secure-authjs.session-token=tok"
        );
    }

    fn request(method: Method) -> Request {
        Request::builder()
            .method(method)
            .uri("/api/auth/session")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_head_is_forwarded_like_get() {
        // Nothing listens on the discard port: reaching the network proves
        // the method was accepted.
        let upstream = UpstreamAuthService::new("http://127.0.0.1:9").unwrap();

        for method in [Method::GET, Method::HEAD] {
            let result = upstream.get(request(method)).await;
            assert!(matches!(result, Err(AuthError::HandlerFailed(_))), "{result:?}");
        }
    }

    #[tokio::test]
    async fn test_get_rejects_other_methods() {
        let upstream = UpstreamAuthService::new("http://127.0.0.1:9").unwrap();

        let result = upstream.get(request(Method::PUT)).await;
        assert!(matches!(result, Err(AuthError::InvalidRequest(_))));

        let result = upstream.post(request(Method::GET)).await;
        assert!(matches!(result, Err(AuthError::InvalidRequest(_))));
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("example.com"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::ACCEPT));
    }
}
