//! Request metadata extractors.
//!
//! These never reject; they exist so route handlers can put the same fields
//! on every log line without re-parsing headers.

use crate::middleware::correlation_id_from_headers;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr};
use uuid::Uuid;

/// Correlation ID for the current request.
///
/// Prefers the value stored by the correlation middleware so handler logs
/// and the response header agree; falls back to the request header or a
/// fresh UUID.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .extensions
            .get::<Uuid>()
            .copied()
            .unwrap_or_else(|| correlation_id_from_headers(&parts.headers));

        Ok(Self(id))
    }
}

/// Client IP address.
///
/// Priority: first entry of `X-Forwarded-For`, then `X-Real-IP`, then
/// loopback.
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(client_ip_from_headers(&parts.headers)))
    }
}

fn client_ip_from_headers(headers: &HeaderMap) -> IpAddr {
    let forwarded = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|ip| ip.trim().parse::<IpAddr>().ok());

    let real_ip = || {
        headers
            .get("X-Real-IP")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

/// `User-Agent` header, `"Unknown"` when absent.
#[derive(Debug, Clone)]
pub struct UserAgent(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for UserAgent
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("Unknown")
            .to_string();

        Ok(Self(user_agent))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).expect("Valid request").into_parts().0
    }

    #[tokio::test]
    async fn test_correlation_id_prefers_extension() {
        let stored = Uuid::new_v4();
        let mut parts = parts(Request::builder().header("X-Correlation-ID", Uuid::new_v4().to_string()));
        parts.extensions.insert(stored);

        let id = CorrelationId::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(id.0, stored);
    }

    #[tokio::test]
    async fn test_correlation_id_from_header() {
        let uuid = Uuid::new_v4();
        let mut parts = parts(Request::builder().header("X-Correlation-ID", uuid.to_string()));

        let id = CorrelationId::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(id.0, uuid);
    }

    #[tokio::test]
    async fn test_client_ip_from_x_forwarded_for() {
        let mut parts = parts(Request::builder().header("X-Forwarded-For", "203.0.113.1, 198.51.100.1"));

        let ip = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ip.0.to_string(), "203.0.113.1");
    }

    #[tokio::test]
    async fn test_client_ip_from_x_real_ip() {
        let mut parts = parts(Request::builder().header("X-Real-IP", "198.51.100.42"));

        let ip = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ip.0.to_string(), "198.51.100.42");
    }

    #[tokio::test]
    async fn test_client_ip_fallback() {
        let mut parts = parts(Request::builder());

        let ip = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ip.0.to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_user_agent() {
        let mut with_header = parts(Request::builder().header(header::USER_AGENT, "Expo/51 (iOS)"));
        let mut without = parts(Request::builder());

        let ua = UserAgent::from_request_parts(&mut with_header, &()).await.unwrap();
        assert_eq!(ua.0, "Expo/51 (iOS)");

        let ua = UserAgent::from_request_parts(&mut without, &()).await.unwrap();
        assert_eq!(ua.0, "Unknown");
    }
}
