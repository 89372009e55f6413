use dashmap::DashMap;

use marquee_core::model::SessionData;

/// Server-side session storage keyed by the opaque cookie id.
///
/// Expiry and eviction belong to the store. `delete` must be atomic: when
/// several callers delete the same id concurrently, exactly one gets the
/// removed session back.
pub trait SessionStore: Send + Sync {
    fn get(&self, id: &str) -> Option<SessionData>;
    fn put(&self, id: &str, session: SessionData);
    fn delete(&self, id: &str) -> Option<SessionData>;
}

/// Process-local store. Sessions do not survive a restart.
///
/// There is no expiry or eviction: a session lives until `delete`. A client
/// that logs in again without logging out leaves its previous session (and
/// its share of the logged-in gauge) here for the life of the process.
/// Deployments that need bounded session lifetimes plug in a store with its
/// own TTL.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, SessionData>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, id: &str) -> Option<SessionData> {
        self.sessions.get(id).map(|r| r.value().clone())
    }

    fn put(&self, id: &str, session: SessionData) {
        self.sessions.insert(id.to_string(), session);
    }

    fn delete(&self, id: &str) -> Option<SessionData> {
        self.sessions.remove(id).map(|(_, s)| s)
    }
}
