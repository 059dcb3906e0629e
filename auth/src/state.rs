//! Session types shared with the auth handler.
//!
//! The JSON shape matches the auth handler's session endpoint, so these types
//! deserialize its responses directly and serialize back unchanged for RPC
//! clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to a user by the auth handler. Opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

/// The signed-in user as exposed by the auth handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// User identifier.
    pub id: UserId,

    /// Display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Email address.
    #[serde(default)]
    pub email: Option<String>,

    /// Avatar URL.
    #[serde(default)]
    pub image: Option<String>,
}

/// A valid session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Session owner.
    pub user: SessionUser,

    /// Expiry timestamp.
    pub expires: DateTime<Utc>,
}

impl Session {
    /// `true` once `now` has reached the expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }
}
