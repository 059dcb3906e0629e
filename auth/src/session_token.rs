//! Session token extraction from auth handler responses.

use crate::constants::SECURE_COOKIE_PREFIX;
use axum::http::{header, HeaderMap};
use cookie::Cookie;
use std::fmt;

/// Opaque session credential issued by the auth handler.
///
/// Read once from the handler's response and relayed once to the mobile
/// client; never stored by the bridge. `Debug` does not print the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the raw value.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// Find the session cookie among a response's `Set-Cookie` headers.
///
/// Accepts `cookie_name` and its `__Secure-` variant. Several cookies folded
/// into one header line (comma separated) are handled; empty values, which
/// the handler uses to clear a session, are ignored.
#[must_use]
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<SessionToken> {
    set_cookie_value(headers, cookie_name).map(SessionToken::new)
}

/// Value of a non-empty cookie set by a response, `__Secure-` variant included.
fn set_cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let secure_name = format!("{SECURE_COOKIE_PREFIX}{cookie_name}");

    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|line| line.split(','))
        .filter_map(|candidate| Cookie::parse(candidate.trim()).ok())
        .find(|cookie| {
            (cookie.name() == cookie_name || cookie.name() == secure_name)
                && !cookie.value().is_empty()
        })
        .map(|cookie| cookie.value().to_string())
}

/// Find the session cookie in a request's `Cookie` header.
#[must_use]
pub fn session_token_from_request(headers: &HeaderMap, cookie_name: &str) -> Option<SessionToken> {
    let secure_name = format!("{SECURE_COOKIE_PREFIX}{cookie_name}");

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| {
            (cookie.name() == cookie_name || cookie.name() == secure_name)
                && !cookie.value().is_empty()
        })
        .map(|cookie| SessionToken::new(cookie.value()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const NAME: &str = "authjs.session-token";

    fn set_cookies(values: &[&'static str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for value in values {
            headers.append(header::SET_COOKIE, HeaderValue::from_static(*value));
        }
        headers
    }

    #[test]
    fn test_extracts_token_with_attributes() {
        let headers = set_cookies(&["authjs.session-token=example-token; Path=/"]);
        assert_eq!(
            extract_session_token(&headers, NAME),
            Some(SessionToken::new("example-token"))
        );
    }

    #[test]
    fn test_skips_other_cookies() {
        let headers = set_cookies(&[
            "authjs.csrf-token=abc; Path=/; HttpOnly",
            "authjs.callback-url=http%3A%2F%2Flocalhost; Path=/",
            "authjs.session-token=tok-123; Path=/; HttpOnly; SameSite=Lax",
        ]);
        assert_eq!(
            extract_session_token(&headers, NAME).map(SessionToken::into_inner),
            Some("tok-123".to_string())
        );
    }

    #[test]
    fn test_accepts_secure_prefix() {
        let headers = set_cookies(&["__Secure-authjs.session-token=secure-tok; Path=/; Secure"]);
        assert_eq!(
            extract_session_token(&headers, NAME).map(SessionToken::into_inner),
            Some("secure-tok".to_string())
        );
    }

    #[test]
    fn test_folded_header_line() {
        let headers = set_cookies(&[
            "authjs.pkce.code_verifier=; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT, authjs.session-token=folded; Path=/",
        ]);
        assert_eq!(
            extract_session_token(&headers, NAME).map(SessionToken::into_inner),
            Some("folded".to_string())
        );
    }

    #[test]
    fn test_missing_or_cleared_token() {
        assert_eq!(extract_session_token(&HeaderMap::new(), NAME), None);

        let cleared = set_cookies(&["authjs.session-token=; Max-Age=0; Path=/"]);
        assert_eq!(extract_session_token(&cleared, NAME), None);
    }

    #[test]
    fn test_token_from_request_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; authjs.session-token=req-tok"),
        );
        assert_eq!(
            session_token_from_request(&headers, NAME).map(SessionToken::into_inner),
            Some("req-tok".to_string())
        );
    }

    #[test]
    fn test_debug_hides_value() {
        assert_eq!(format!("{:?}", SessionToken::new("secret")), "SessionToken(..)");
    }
}
