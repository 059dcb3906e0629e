//! Mobile redirect state machine.
//!
//! A mobile client that signs in through the web flow passes its callback URL
//! on the sign-in request. The URL is parked in a redirect marker until the
//! provider callback arrives; the callback consumes the marker and sends the
//! client back to its URL with the freshly issued session token.
//!
//! ```text
//!            signin?expo-redirect=<url>          callback (marker present)
//!   Idle ─────────────────────────────► Pending ───────────────────────────► Idle
//!     ▲                                    │ signin again: last write wins
//!     └──────── marker expires ────────────┘
//! ```
//!
//! Transitions are pure ([`RedirectState::begin`], [`RedirectState::complete`]);
//! persistence goes through a [`MarkerStore`]. Two stores are provided:
//!
//! - [`CookieMarkerStore`]: the request-scoped cookie jar. The client keeps
//!   the marker and the browser enforces the TTL.
//! - [`InMemoryMarkerStore`]: a server-side map keyed by [`ClientKey`] with
//!   explicit expiry, useful when the client cannot hold cookies and in tests.

use crate::clock::Clock;
use crate::config::MobileRedirectConfig;
use crate::constants::SESSION_TOKEN_QUERY_PARAM;
use crate::error::{AuthError, Result};
use crate::session_token::SessionToken;
use chrono::{DateTime, Duration, Utc};
use cookie::Cookie;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower_cookies::Cookies;

/// Pending mobile redirect: the callback URL supplied at sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectMarker {
    /// Absolute URL the mobile client asked to be sent back to. Opaque.
    pub callback_url: String,
}

impl RedirectMarker {
    /// Create a marker for the given callback URL.
    #[must_use]
    pub fn new(callback_url: impl Into<String>) -> Self {
        Self {
            callback_url: callback_url.into(),
        }
    }

    /// `Location` sent to the mobile client once the session token is known.
    #[must_use]
    pub fn redirect_location(&self, token: &SessionToken) -> String {
        format!(
            "{}/?{SESSION_TOKEN_QUERY_PARAM}={}",
            self.callback_url,
            urlencoding::encode(token.as_str())
        )
    }
}

/// Where a client stands in the mobile redirect flow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RedirectState {
    /// No marker.
    #[default]
    Idle,
    /// Marker set, waiting for the callback.
    PendingRedirect(RedirectMarker),
}

/// Result of a callback against the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// No marker was pending; the callback is an ordinary one.
    NotPending,
    /// Marker consumed; send the client to `location`.
    Redirect {
        /// Callback URL with the session token appended.
        location: String,
    },
    /// Marker consumed, but the auth handler issued no session token.
    MissingToken {
        /// Callback URL of the consumed marker.
        callback_url: String,
    },
}

impl RedirectState {
    /// State implied by what a store currently holds.
    #[must_use]
    pub fn from_marker(marker: Option<RedirectMarker>) -> Self {
        marker.map_or(Self::Idle, Self::PendingRedirect)
    }

    /// Sign-in with a callback URL. Replaces any pending marker.
    #[must_use]
    pub fn begin(self, callback_url: impl Into<String>) -> Self {
        Self::PendingRedirect(RedirectMarker::new(callback_url))
    }

    /// Callback completion. Always returns to `Idle`: a marker is consumed
    /// whether or not a token was issued.
    #[must_use]
    pub fn complete(self, token: Option<&SessionToken>) -> (Self, CallbackOutcome) {
        let outcome = match (self, token) {
            (Self::Idle, _) => CallbackOutcome::NotPending,
            (Self::PendingRedirect(marker), Some(token)) => CallbackOutcome::Redirect {
                location: marker.redirect_location(token),
            },
            (Self::PendingRedirect(marker), None) => CallbackOutcome::MissingToken {
                callback_url: marker.callback_url,
            },
        };
        (Self::Idle, outcome)
    }

    /// `true` while a marker is pending.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::PendingRedirect(_))
    }
}

/// Storage for one client's redirect marker.
///
/// Implementations are request scoped: they already know which client they
/// serve.
pub trait MarkerStore: Send + Sync {
    /// Current marker, if any and not expired.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MarkerStore`] if the store is unavailable.
    fn load(&self) -> Result<Option<RedirectMarker>>;

    /// Store a marker for `ttl`, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MarkerStore`] if the store is unavailable.
    fn save(&self, marker: &RedirectMarker, ttl: Duration) -> Result<()>;

    /// Delete the marker.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MarkerStore`] if the store is unavailable.
    fn clear(&self) -> Result<()>;
}

/// Marker kept in the client's cookie jar.
#[derive(Clone)]
pub struct CookieMarkerStore {
    cookies: Cookies,
    config: MobileRedirectConfig,
}

impl CookieMarkerStore {
    /// Wrap the request's cookie jar.
    #[must_use]
    pub const fn new(cookies: Cookies, config: MobileRedirectConfig) -> Self {
        Self { cookies, config }
    }

    fn base_cookie(&self, value: String) -> cookie::CookieBuilder<'static> {
        Cookie::build((self.config.marker_cookie.clone(), value))
            .path(self.config.marker_path.clone())
            .secure(self.config.secure_cookies)
    }
}

impl MarkerStore for CookieMarkerStore {
    fn load(&self) -> Result<Option<RedirectMarker>> {
        Ok(self
            .cookies
            .get(&self.config.marker_cookie)
            .and_then(|c| urlencoding::decode(c.value()).ok().map(std::borrow::Cow::into_owned))
            .filter(|value| !value.is_empty())
            .map(RedirectMarker::new))
    }

    fn save(&self, marker: &RedirectMarker, ttl: Duration) -> Result<()> {
        // Cookie values cannot carry `;`, `,` or spaces.
        let cookie = self
            .base_cookie(urlencoding::encode(&marker.callback_url).into_owned())
            .max_age(cookie::time::Duration::seconds(ttl.num_seconds()))
            .build();
        self.cookies.add(cookie);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.cookies.remove(self.base_cookie(String::new()).build());
        Ok(())
    }
}

/// Identifies a client in the [`InMemoryMarkerStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey(pub String);

#[derive(Debug, Clone)]
struct StoredMarker {
    marker: RedirectMarker,
    expires_at: DateTime<Utc>,
}

/// Server-side marker store keyed by client, with explicit expiry.
///
/// Expired entries are invisible to [`MarkerStore::load`] and removed on
/// access or by [`InMemoryMarkerStore::purge_expired`].
pub struct InMemoryMarkerStore<C> {
    entries: Arc<Mutex<HashMap<ClientKey, StoredMarker>>>,
    clock: Arc<C>,
}

impl<C> Clone for InMemoryMarkerStore<C> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C: Clock> InMemoryMarkerStore<C> {
    /// Create an empty store.
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock: Arc::new(clock),
        }
    }

    /// Store handle for one client.
    #[must_use]
    pub fn for_client(&self, key: ClientKey) -> ClientMarkerStore<C> {
        ClientMarkerStore {
            store: self.clone(),
            key,
        }
    }

    /// Remove every expired marker. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MarkerStore`] if the lock is poisoned.
    pub fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|_, stored| stored.expires_at > now);
        Ok(before - entries.len())
    }

    /// Number of markers held, expired ones included.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MarkerStore`] if the lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// `true` when no marker is held.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MarkerStore`] if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<ClientKey, StoredMarker>>> {
        self.entries
            .lock()
            .map_err(|_| AuthError::MarkerStore("Mutex lock failed".to_string()))
    }
}

/// [`InMemoryMarkerStore`] scoped to one client.
pub struct ClientMarkerStore<C> {
    store: InMemoryMarkerStore<C>,
    key: ClientKey,
}

impl<C: Clock> MarkerStore for ClientMarkerStore<C> {
    fn load(&self) -> Result<Option<RedirectMarker>> {
        let now = self.store.clock.now();
        let mut entries = self.store.lock()?;

        let live = entries
            .get(&self.key)
            .map(|stored| (stored.expires_at > now).then(|| stored.marker.clone()));

        match live {
            Some(Some(marker)) => Ok(Some(marker)),
            Some(None) => {
                entries.remove(&self.key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn save(&self, marker: &RedirectMarker, ttl: Duration) -> Result<()> {
        let expires_at = self.store.clock.now() + ttl;
        self.store.lock()?.insert(
            self.key.clone(),
            StoredMarker {
                marker: marker.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.store.lock()?.remove(&self.key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mocks::FixedClock;

    fn token(value: &str) -> SessionToken {
        SessionToken::new(value)
    }

    #[test]
    fn test_begin_from_idle_and_pending() {
        let pending = RedirectState::Idle.begin("exp://first");
        assert_eq!(
            pending,
            RedirectState::PendingRedirect(RedirectMarker::new("exp://first"))
        );

        let replaced = pending.begin("exp://second");
        assert_eq!(
            replaced,
            RedirectState::PendingRedirect(RedirectMarker::new("exp://second"))
        );
    }

    #[test]
    fn test_complete_with_token_redirects() {
        let state = RedirectState::from_marker(Some(RedirectMarker::new("http://expo.io")));

        let (next, outcome) = state.complete(Some(&token("example-token")));

        assert_eq!(next, RedirectState::Idle);
        assert_eq!(
            outcome,
            CallbackOutcome::Redirect {
                location: "http://expo.io/?session_token=example-token".to_string()
            }
        );
    }

    #[test]
    fn test_complete_without_token_still_consumes_marker() {
        let state = RedirectState::from_marker(Some(RedirectMarker::new("http://expo.io")));

        let (next, outcome) = state.complete(None);

        assert!(!next.is_pending());
        assert_eq!(
            outcome,
            CallbackOutcome::MissingToken {
                callback_url: "http://expo.io".to_string()
            }
        );
    }

    #[test]
    fn test_complete_from_idle_is_not_pending() {
        let (next, outcome) = RedirectState::Idle.complete(Some(&token("t")));
        assert_eq!(next, RedirectState::Idle);
        assert_eq!(outcome, CallbackOutcome::NotPending);
    }

    #[test]
    fn test_redirect_location_encodes_token() {
        let marker = RedirectMarker::new("exp://192.168.1.2:8081");
        assert_eq!(
            marker.redirect_location(&token("a b+c")),
            "exp://192.168.1.2:8081/?session_token=a%20b%2Bc"
        );
    }

    #[test]
    fn test_in_memory_store_round_trip_and_last_write_wins() {
        let store = InMemoryMarkerStore::new(FixedClock::default());
        let client = store.for_client(ClientKey("device-1".into()));

        assert_eq!(client.load().unwrap(), None);

        client.save(&RedirectMarker::new("exp://a"), Duration::minutes(10)).unwrap();
        client.save(&RedirectMarker::new("exp://b"), Duration::minutes(10)).unwrap();
        assert_eq!(client.load().unwrap(), Some(RedirectMarker::new("exp://b")));

        client.clear().unwrap();
        assert_eq!(client.load().unwrap(), None);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_in_memory_store_isolates_clients() {
        let store = InMemoryMarkerStore::new(FixedClock::default());
        let a = store.for_client(ClientKey("a".into()));
        let b = store.for_client(ClientKey("b".into()));

        a.save(&RedirectMarker::new("exp://a"), Duration::minutes(10)).unwrap();

        assert_eq!(b.load().unwrap(), None);
        b.clear().unwrap();
        assert_eq!(a.load().unwrap(), Some(RedirectMarker::new("exp://a")));
    }

    #[test]
    fn test_in_memory_store_expiry() {
        let clock = FixedClock::default();
        let store = InMemoryMarkerStore::new(clock.clone());
        let client = store.for_client(ClientKey("device-1".into()));
        let other = store.for_client(ClientKey("device-2".into()));

        client.save(&RedirectMarker::new("exp://a"), Duration::minutes(10)).unwrap();
        other.save(&RedirectMarker::new("exp://b"), Duration::minutes(10)).unwrap();

        clock.advance(Duration::minutes(9));
        assert!(client.load().unwrap().is_some());

        clock.advance(Duration::minutes(1));
        assert_eq!(client.load().unwrap(), None);
        assert_eq!(store.len().unwrap(), 1);

        assert_eq!(store.purge_expired().unwrap(), 1);
        assert!(store.is_empty().unwrap());
    }
}
