//! Mock session store for testing.

use crate::error::{AuthError, Result};
use crate::providers::SessionStore;
use crate::session_token::SessionToken;
use crate::state::Session;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Inner {
    sessions: HashMap<String, Session>,
    invalidated: HashSet<String>,
}

/// Mock session store.
///
/// Uses in-memory storage for testing. Invalidated tokens stop resolving and
/// are remembered so tests can assert on them.
#[derive(Debug, Clone, Default)]
pub struct MockSessionStore {
    inner: Arc<Mutex<Inner>>,
    should_fail: bool,
}

impl MockSessionStore {
    /// Create an empty mock session store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose every call fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Register a session for `token`.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn insert(&self, token: impl Into<String>, session: Session) -> Result<()> {
        let mut inner = lock(&self.inner)?;
        inner.sessions.insert(token.into(), session);
        Ok(())
    }

    /// `true` once `token` has been invalidated.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn was_invalidated(&self, token: &str) -> Result<bool> {
        Ok(lock(&self.inner)?.invalidated.contains(token))
    }

    /// Number of live sessions.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn session_count(&self) -> Result<usize> {
        Ok(lock(&self.inner)?.sessions.len())
    }
}

fn lock(inner: &Mutex<Inner>) -> Result<std::sync::MutexGuard<'_, Inner>> {
    inner
        .lock()
        .map_err(|_| AuthError::SessionStore("Mutex lock failed".to_string()))
}

impl SessionStore for MockSessionStore {
    fn validate_token(
        &self,
        token: &SessionToken,
    ) -> impl Future<Output = Result<Option<Session>>> + Send {
        let inner = Arc::clone(&self.inner);
        let token = token.as_str().to_string();
        let should_fail = self.should_fail;

        async move {
            if should_fail {
                return Err(AuthError::SessionStore("mock session store failure".to_string()));
            }
            Ok(lock(&inner)?.sessions.get(&token).cloned())
        }
    }

    fn invalidate_token(&self, token: &SessionToken) -> impl Future<Output = Result<()>> + Send {
        let inner = Arc::clone(&self.inner);
        let token = token.as_str().to_string();
        let should_fail = self.should_fail;

        async move {
            if should_fail {
                return Err(AuthError::SessionStore("mock session store failure".to_string()));
            }
            let mut guard = lock(&inner)?;
            guard.sessions.remove(&token);
            guard.invalidated.insert(token);
            Ok(())
        }
    }
}
