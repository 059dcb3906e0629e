//! Auth action decoding.
//!
//! The first path segment after the auth mount selects the action. It is
//! decoded once at the boundary so the dispatcher can match exhaustively.

use crate::constants::actions;
use std::fmt;

/// Action addressed by an auth endpoint request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRoute {
    /// `signin`: may start a mobile redirect.
    SignIn,
    /// `callback`: may complete a mobile redirect.
    Callback,
    /// Anything else, passed through to the auth handler. Empty when the
    /// request carried no action segment.
    Other(String),
}

impl AuthRoute {
    /// Decode from the path below the auth mount, e.g. `"signin/github"`.
    ///
    /// Only the first non-empty segment is significant; it is matched
    /// case-sensitively, as the auth handler does.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let segment = path.split('/').find(|s| !s.is_empty()).unwrap_or_default();
        Self::from_segment(segment)
    }

    /// Decode a single action segment.
    #[must_use]
    pub fn from_segment(segment: &str) -> Self {
        match segment {
            actions::SIGN_IN => Self::SignIn,
            actions::CALLBACK => Self::Callback,
            other => Self::Other(other.to_string()),
        }
    }

    /// The action segment as it appears in the path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::SignIn => actions::SIGN_IN,
            Self::Callback => actions::CALLBACK,
            Self::Other(segment) => segment,
        }
    }
}

impl fmt::Display for AuthRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(segment) if segment.is_empty() => f.write_str("unknown"),
            route => f.write_str(route.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_known_actions() {
        assert_eq!(AuthRoute::from_path("signin"), AuthRoute::SignIn);
        assert_eq!(AuthRoute::from_path("signin/github"), AuthRoute::SignIn);
        assert_eq!(AuthRoute::from_path("/callback/discord"), AuthRoute::Callback);
    }

    #[test]
    fn test_other_actions_keep_their_segment() {
        assert_eq!(
            AuthRoute::from_path("session"),
            AuthRoute::Other("session".to_string())
        );
        assert_eq!(
            AuthRoute::from_segment("SignIn"),
            AuthRoute::Other("SignIn".to_string())
        );
    }

    #[test]
    fn test_missing_segment_is_unknown() {
        let route = AuthRoute::from_path("");
        assert_eq!(route, AuthRoute::Other(String::new()));
        assert_eq!(route.to_string(), "unknown");
    }
}
