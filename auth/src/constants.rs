//! Authentication constants.
//!
//! Cookie and parameter names shared with the mobile client and the upstream
//! auth service. Changing any of them breaks deployed clients.

/// Cookie holding the mobile callback URL between sign-in and callback.
pub const REDIRECT_MARKER_COOKIE: &str = "__acme-expo-redirect-state";

/// Lifetime of the redirect marker, in seconds (10 minutes).
pub const REDIRECT_MARKER_TTL_SECS: i64 = 60 * 10;

/// Path scope of the redirect marker cookie.
pub const REDIRECT_MARKER_PATH: &str = "/";

/// Query parameter carrying the mobile callback URL on sign-in.
pub const MOBILE_REDIRECT_PARAM: &str = "expo-redirect";

/// Session cookie issued by the auth handler.
pub const SESSION_TOKEN_COOKIE: &str = "authjs.session-token";

/// Prefix the auth handler adds to cookie names in a secure context.
pub const SECURE_COOKIE_PREFIX: &str = "__Secure-";

/// Query parameter used to relay the session token to the mobile client.
pub const SESSION_TOKEN_QUERY_PARAM: &str = "session_token";

/// Auth action path segments with special handling.
pub mod actions {
    /// Sign-in initiation.
    pub const SIGN_IN: &str = "signin";

    /// Provider callback.
    pub const CALLBACK: &str = "callback";
}
