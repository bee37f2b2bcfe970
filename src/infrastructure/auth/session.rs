//! Server-held session records with idle expiry
//!
//! Sessions are keyed by an opaque id handed to the client as a cookie.
//! The expiry check runs strictly before any activity refresh: touching
//! first would reset the very clock the check evaluates and make sessions
//! unkillable. The check-then-touch sequence for one session id executes
//! under that id's map entry lock, so two concurrent requests cannot race
//! one destroying a session the other just extended.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::{Error, Result};
use crate::domain::model::{OrganizationId, RoleId, UserId};
use crate::domain::principal::Principal;
use crate::infrastructure::utils::TimeUtils;

/// User snapshot embedded in a session at login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub username: String,
    pub role: String,
    pub role_id: Option<RoleId>,
    pub organization_id: Option<OrganizationId>,
    pub current_organization_id: Option<OrganizationId>,
}

impl SessionUser {
    /// Principal view of the snapshot
    pub fn to_principal(&self) -> Principal {
        Principal {
            id: self.id,
            username: self.username.clone(),
            role: self.role.clone(),
            role_id: self.role_id,
            organization_id: self.organization_id,
            current_organization_id: self.current_organization_id,
        }
    }
}

/// Ephemeral server-side session record
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub user: SessionUser,
    /// Unix seconds of the most recent authenticated request
    pub last_activity: u64,
}

/// Keyed session store with idle timeout
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    idle_timeout_secs: u64,
}

impl SessionStore {
    pub fn new(idle_timeout_secs: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_timeout_secs,
        }
    }

    /// Create a session for a logged-in user, returning the opaque id
    pub fn create(&self, user: SessionUser) -> String {
        self.create_at(user, TimeUtils::now_unix_secs())
    }

    /// Create with an explicit timestamp
    pub fn create_at(&self, user: SessionUser, now: u64) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions.insert(
            id.clone(),
            Session {
                id: id.clone(),
                user,
                last_activity: now,
            },
        );
        id
    }

    /// Raw lookup without expiry semantics
    pub fn get(&self, id: &str) -> Option<Session> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    /// Expiry check followed by activity refresh, atomic per session id
    ///
    /// An idle session past the timeout is destroyed and reported as
    /// `SessionExpired` before any activity update is applied. Only a
    /// still-valid session gets its `last_activity` advanced, and it only
    /// ever moves forward in time.
    pub fn validate_and_touch(&self, id: &str) -> Result<Session> {
        self.validate_and_touch_at(id, TimeUtils::now_unix_secs())
    }

    /// [`Self::validate_and_touch`] with an explicit timestamp
    pub fn validate_and_touch_at(&self, id: &str, now: u64) -> Result<Session> {
        match self.sessions.entry(id.to_string()) {
            Entry::Occupied(mut occupied) => {
                let idle = now.saturating_sub(occupied.get().last_activity);
                if idle > self.idle_timeout_secs {
                    occupied.remove();
                    return Err(Error::SessionExpired);
                }

                let session = occupied.get_mut();
                if now > session.last_activity {
                    session.last_activity = now;
                }
                Ok(session.clone())
            }
            Entry::Vacant(_) => Err(Error::Unauthenticated),
        }
    }

    /// Destroy a session; idempotent
    pub fn destroy(&self, id: &str) {
        self.sessions.remove(id);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SessionUser {
        SessionUser {
            id: 5,
            username: "nurse.kim".to_string(),
            role: "nurse".to_string(),
            role_id: Some(4),
            organization_id: Some(2),
            current_organization_id: None,
        }
    }

    #[test]
    fn test_requests_within_timeout_advance_activity() {
        let store = SessionStore::new(100);
        let id = store.create_at(snapshot(), 1_000);

        let s1 = store.validate_and_touch_at(&id, 1_050).expect("valid");
        assert_eq!(s1.last_activity, 1_050);

        let s2 = store.validate_and_touch_at(&id, 1_140).expect("valid");
        assert_eq!(s2.last_activity, 1_140);
    }

    #[test]
    fn test_idle_past_timeout_expires_before_touch() {
        let store = SessionStore::new(100);
        let id = store.create_at(snapshot(), 1_000);

        let result = store.validate_and_touch_at(&id, 1_101);
        assert!(matches!(result, Err(Error::SessionExpired)));
        // destroyed as a side effect of the check
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn test_expired_session_is_gone_even_if_clock_rolls_back() {
        let store = SessionStore::new(100);
        let id = store.create_at(snapshot(), 1_000);

        assert!(store.validate_and_touch_at(&id, 2_000).is_err());

        // a later request with an earlier clock cannot resurrect it
        let result = store.validate_and_touch_at(&id, 1_010);
        assert!(matches!(result, Err(Error::Unauthenticated)));
    }

    #[test]
    fn test_activity_is_monotonic() {
        let store = SessionStore::new(100);
        let id = store.create_at(snapshot(), 1_000);

        store.validate_and_touch_at(&id, 1_050).expect("valid");
        // an out-of-order timestamp within the window does not move the clock back
        let session = store.validate_and_touch_at(&id, 1_020).expect("valid");
        assert_eq!(session.last_activity, 1_050);
    }

    #[test]
    fn test_exactly_at_timeout_is_still_valid() {
        let store = SessionStore::new(100);
        let id = store.create_at(snapshot(), 1_000);

        // strictly greater than timeout expires; equal does not
        assert!(store.validate_and_touch_at(&id, 1_100).is_ok());
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let store = SessionStore::new(100);
        let id = store.create_at(snapshot(), 1_000);

        store.destroy(&id);
        store.destroy(&id);
        assert!(store.is_empty());
    }

    #[test]
    fn test_unknown_session_is_unauthenticated() {
        let store = SessionStore::new(100);
        assert!(matches!(
            store.validate_and_touch_at("nope", 1_000),
            Err(Error::Unauthenticated)
        ));
    }
}
