//! Configuration management for the server.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Unparseable values fall back to the default rather than aborting startup.

use acme_api::DEFAULT_ENDPOINT;
use acme_auth::constants::REDIRECT_MARKER_TTL_SECS;
use std::env;

/// Default address of the auth service the bridge fronts.
pub const DEFAULT_AUTH_URL: &str = "http://127.0.0.1:3001";

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP listener configuration
    pub server: ServerConfig,
    /// Auth bridge configuration
    pub auth: AuthConfig,
    /// Mount path of the RPC endpoint
    pub trpc_endpoint: String,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

/// Auth bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Origin of the auth service
    pub url: String,
    /// Use `__Secure-` cookies and `Secure` markers (HTTPS deployments)
    pub secure_cookies: bool,
    /// Redirect marker lifetime in seconds (default: 10 minutes)
    pub marker_ttl: u64,
}

impl Config {
    /// Load configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from `lookup`, which maps a variable name to its value.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parse_var<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            lookup(key).and_then(|value| value.parse().ok())
        }
        let flag = |key: &str| {
            lookup(key).is_some_and(|value| {
                matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes")
            })
        };

        Self {
            server: ServerConfig {
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_var(&lookup, "PORT").unwrap_or(8080),
                log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                shutdown_timeout: parse_var(&lookup, "SHUTDOWN_TIMEOUT").unwrap_or(30),
            },
            auth: AuthConfig {
                url: lookup("AUTH_URL").unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
                secure_cookies: flag("AUTH_SECURE_COOKIES"),
                marker_ttl: parse_var(&lookup, "MOBILE_REDIRECT_TTL")
                    .unwrap_or(REDIRECT_MARKER_TTL_SECS.unsigned_abs()),
            },
            trpc_endpoint: lookup("TRPC_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        }
    }

    /// `host:port` to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
