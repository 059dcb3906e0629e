//! Auth bridge configuration.
//!
//! Values default to what deployed mobile clients expect; the application
//! overrides them through the builder methods.

use crate::constants::{
    MOBILE_REDIRECT_PARAM, REDIRECT_MARKER_COOKIE, REDIRECT_MARKER_PATH,
    REDIRECT_MARKER_TTL_SECS, SESSION_TOKEN_COOKIE,
};
use chrono::Duration;

/// Mobile sign-in redirect configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobileRedirectConfig {
    /// Name of the redirect marker cookie.
    pub marker_cookie: String,

    /// Marker lifetime.
    ///
    /// Default: 10 minutes
    pub marker_ttl: Duration,

    /// Path scope of the marker cookie.
    pub marker_path: String,

    /// Sign-in query parameter carrying the mobile callback URL.
    pub redirect_param: String,

    /// Session cookie emitted by the auth handler, without any `__Secure-` prefix.
    pub session_cookie: String,

    /// Mark the marker cookie `Secure`.
    ///
    /// Default: false
    pub secure_cookies: bool,
}

impl MobileRedirectConfig {
    /// Create a configuration with the default names and TTL.
    #[must_use]
    pub fn new() -> Self {
        Self {
            marker_cookie: REDIRECT_MARKER_COOKIE.to_string(),
            marker_ttl: Duration::seconds(REDIRECT_MARKER_TTL_SECS),
            marker_path: REDIRECT_MARKER_PATH.to_string(),
            redirect_param: MOBILE_REDIRECT_PARAM.to_string(),
            session_cookie: SESSION_TOKEN_COOKIE.to_string(),
            secure_cookies: false,
        }
    }

    /// Set marker lifetime.
    #[must_use]
    pub const fn with_marker_ttl(mut self, ttl: Duration) -> Self {
        self.marker_ttl = ttl;
        self
    }

    /// Set the session cookie name to look for in auth handler responses.
    #[must_use]
    pub fn with_session_cookie(mut self, name: impl Into<String>) -> Self {
        self.session_cookie = name.into();
        self
    }

    /// Toggle the `Secure` attribute on the marker cookie.
    #[must_use]
    pub const fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }
}

impl Default for MobileRedirectConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MobileRedirectConfig::default();

        assert_eq!(config.marker_cookie, "__acme-expo-redirect-state");
        assert_eq!(config.marker_ttl, Duration::minutes(10));
        assert_eq!(config.marker_path, "/");
        assert_eq!(config.redirect_param, "expo-redirect");
        assert_eq!(config.session_cookie, "authjs.session-token");
        assert!(!config.secure_cookies);
    }

    #[test]
    fn test_config_builder() {
        let config = MobileRedirectConfig::new()
            .with_marker_ttl(Duration::minutes(2))
            .with_session_cookie("next-auth.session-token")
            .with_secure_cookies(true);

        assert_eq!(config.marker_ttl, Duration::minutes(2));
        assert_eq!(config.session_cookie, "next-auth.session-token");
        assert!(config.secure_cookies);
    }
}
