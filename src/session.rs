//! Staff login sessions.
//!
//! A successful login hands the client a random bearer token. Only the
//! SHA-256 of the token is kept, so a memory dump of the store cannot be
//! replayed. Sessions expire after a period of inactivity; every
//! successful check refreshes the idle clock.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use uuid::Uuid;

/// The caller identity that authenticated handlers receive. Passed
/// explicitly; nothing reads "the current user" from global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedStaff {
    pub staff_id: Uuid,
    pub username: String,
}

#[derive(Debug)]
struct SessionEntry {
    staff: AuthenticatedStaff,
    last_seen: Instant,
}

/// In-memory session table keyed by token hash.
pub struct SessionStore {
    sessions: HashMap<[u8; 32], SessionEntry>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            idle_timeout,
        }
    }

    /// Open a session and return the bearer token for it.
    pub fn create(&mut self, staff: AuthenticatedStaff) -> String {
        self.purge_expired();
        let token = generate_token();
        self.sessions.insert(
            hash_token(&token),
            SessionEntry {
                staff,
                last_seen: Instant::now(),
            },
        );
        token
    }

    /// Resolve a token to its staff member, refreshing the idle clock.
    /// Expired sessions are dropped on sight.
    pub fn authenticate(&mut self, token: &str) -> Option<AuthenticatedStaff> {
        let key = hash_token(token);
        let now = Instant::now();

        match self.sessions.get_mut(&key) {
            Some(entry) if now.duration_since(entry.last_seen) < self.idle_timeout => {
                entry.last_seen = now;
                return Some(entry.staff.clone());
            }
            Some(_) => {}
            None => return None,
        }

        self.sessions.remove(&key);
        tracing::debug!("Session expired after inactivity");
        None
    }

    /// End a session. Returns whether one existed.
    pub fn revoke(&mut self, token: &str) -> bool {
        self.sessions.remove(&hash_token(token)).is_some()
    }

    /// Drop every idle-expired session. Returns how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let timeout = self.idle_timeout;
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| now.duration_since(entry.last_seen) < timeout);
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff(name: &str) -> AuthenticatedStaff {
        AuthenticatedStaff {
            staff_id: Uuid::new_v4(),
            username: name.into(),
        }
    }

    #[test]
    fn token_authenticates_its_owner() {
        let mut store = SessionStore::new(Duration::from_secs(60));
        let alice = staff("alice");
        let token = store.create(alice.clone());
        assert_eq!(store.authenticate(&token), Some(alice));
    }

    #[test]
    fn unknown_token_rejected() {
        let mut store = SessionStore::new(Duration::from_secs(60));
        store.create(staff("alice"));
        assert_eq!(store.authenticate("forged-token"), None);
    }

    #[test]
    fn tokens_are_unique_per_login() {
        let mut store = SessionStore::new(Duration::from_secs(60));
        let t1 = store.create(staff("alice"));
        let t2 = store.create(staff("alice"));
        assert_ne!(t1, t2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn revoked_token_stops_working() {
        let mut store = SessionStore::new(Duration::from_secs(60));
        let token = store.create(staff("bob"));
        assert!(store.revoke(&token));
        assert_eq!(store.authenticate(&token), None);
        assert!(!store.revoke(&token));
    }

    #[test]
    fn idle_session_expires() {
        let mut store = SessionStore::new(Duration::from_millis(20));
        let token = store.create(staff("carol"));
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(store.authenticate(&token), None);
        assert!(store.is_empty());
    }

    #[test]
    fn activity_refreshes_idle_clock() {
        let mut store = SessionStore::new(Duration::from_millis(200));
        let token = store.create(staff("dave"));
        for _ in 0..4 {
            std::thread::sleep(Duration::from_millis(80));
            assert!(store.authenticate(&token).is_some());
        }
    }

    #[test]
    fn create_purges_expired_sessions() {
        let mut store = SessionStore::new(Duration::from_millis(50));
        let old = store.create(staff("old"));
        std::thread::sleep(Duration::from_millis(70));
        let new = store.create(staff("new"));
        assert_eq!(store.len(), 1);
        assert!(store.authenticate(&new).is_some());
        assert!(store.authenticate(&old).is_none());
    }

    #[test]
    fn purge_reports_removed_count() {
        let mut store = SessionStore::new(Duration::from_millis(20));
        store.create(staff("a"));
        store.create(staff("b"));
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(store.purge_expired(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn hash_is_deterministic_and_hides_token() {
        let token = generate_token();
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), hash_token("other"));
        assert_eq!(token.len(), 43);
    }
}
