//! Authenticated-session state owned by one `ApiClient`.
//!
//! # Design
//! The whole record sits behind a single `RwLock`, so a reader sees either
//! the session before a transition or the one after it, never a token from
//! one generation paired with a profile from another. `SessionState` is a
//! cheap handle: the client keeps one, and the auth interceptor keeps a clone
//! for reading. Only the client writes.
//!
//! Writes that follow a network round-trip (`clear`, `update_profile`) name
//! the token the request was sent under and do nothing if another login has
//! replaced it in the meantime.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::types::{AuthResponse, User};

/// Token type used when the server does not name one.
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Snapshot of the current session. An empty `access_token` means no
/// authenticated session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    pub profile: User,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Value for the `Authorization` header, if authenticated.
    pub fn authorization(&self) -> Option<String> {
        if !self.is_authenticated() {
            return None;
        }
        let token_type = if self.token_type.is_empty() {
            DEFAULT_TOKEN_TYPE
        } else {
            self.token_type.as_str()
        };
        Some(format!("{token_type} {}", self.access_token))
    }
}

/// Shared, lock-guarded handle to a `Session`.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    inner: Arc<RwLock<Session>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    /// Consistent copy of the whole record.
    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    pub fn authorization(&self) -> Option<String> {
        self.read().authorization()
    }

    /// Token of the current session, empty when unauthenticated.
    pub fn access_token(&self) -> String {
        self.read().access_token.clone()
    }

    /// Replaces the whole record with a freshly decoded login result.
    pub fn set_from_login(&self, auth: &AuthResponse) {
        *self.write() = Session {
            access_token: auth.access_token.clone(),
            token_type: auth.token_type.clone(),
            profile: auth.me.clone(),
        };
    }

    /// Resets every field if the session is still the one opened with
    /// `token`. Returns whether it was cleared; an empty or stale token
    /// leaves the record untouched.
    pub fn clear(&self, token: &str) -> bool {
        let mut session = self.write();
        if !is_current(&session, token) {
            return false;
        }
        *session = Session::default();
        true
    }

    /// Replaces only the profile, under the same generation check as
    /// `clear`. Returns `false` when there is no authenticated session or it
    /// no longer belongs to `token`.
    pub fn update_profile(&self, token: &str, profile: User) -> bool {
        let mut session = self.write();
        if !is_current(&session, token) {
            return false;
        }
        session.profile = profile;
        true
    }

    // A panic while holding the lock cannot leave a half-written record:
    // every write assigns whole values.
    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn is_current(session: &Session, token: &str) -> bool {
    session.is_authenticated() && session.access_token == token
}
