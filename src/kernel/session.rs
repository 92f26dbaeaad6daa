use std::sync::Arc;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::time::Clock;

/// Sliding inactivity window. Every read inside it renews the session.
pub const SESSION_WINDOW_MS: u64 = 5 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub id: String,
    pub last_activity_ms: u64,
}

/// Where the current session lives between reads.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Option<StoredSession>;
    fn save(&self, session: StoredSession);
    fn remove(&self);
}

/// Per-instance store. Each client owns its own, so two concurrent visits
/// never share an id, and nothing outlives the instance.
#[derive(Debug, Default)]
pub struct TabStore {
    slot: Mutex<Option<StoredSession>>,
}

impl TabStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for TabStore {
    fn load(&self) -> Option<StoredSession> {
        self.slot.lock().clone()
    }

    fn save(&self, session: StoredSession) {
        *self.slot.lock() = Some(session);
    }

    fn remove(&self) {
        *self.slot.lock() = None;
    }
}

/// Mints and renews the tab-scoped session id.
///
/// `renewal` serializes every load-check-save sequence against `reset`,
/// `clear` and `adopt`, so a renewal can never resurrect a discarded id and
/// racing reads after expiry agree on one replacement.
pub struct SessionIdentity {
    store: Option<Box<dyn SessionStore>>,
    clock: Arc<dyn Clock>,
    window_ms: u64,
    renewal: Mutex<()>,
}

impl SessionIdentity {
    pub fn new(store: Box<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store: Some(store), clock, window_ms: SESSION_WINDOW_MS, renewal: Mutex::new(()) }
    }

    /// No persistence available (headless/server rendering). Every read
    /// synthesizes a fresh, unstable id.
    pub fn detached(clock: Arc<dyn Clock>) -> Self {
        Self { store: None, clock, window_ms: SESSION_WINDOW_MS, renewal: Mutex::new(()) }
    }

    pub fn with_window_ms(mut self, window_ms: u64) -> Self {
        self.window_ms = window_ms;
        self
    }

    pub fn is_detached(&self) -> bool {
        self.store.is_none()
    }

    pub fn get_or_create(&self) -> String {
        let Some(store) = self.store.as_ref() else {
            return mint();
        };

        let _renewal = self.renewal.lock();
        let now = self.clock.now_ms();
        if let Some(current) = store.load() {
            if now.saturating_sub(current.last_activity_ms) < self.window_ms {
                store.save(StoredSession { id: current.id.clone(), last_activity_ms: now });
                return current.id;
            }
            debug!(session_id = %current.id, "session expired after inactivity");
        }

        let id = mint();
        store.save(StoredSession { id: id.clone(), last_activity_ms: now });
        debug!(session_id = %id, "minted session");
        id
    }

    /// Make `id` the current session, renewed as of now.
    pub fn adopt(&self, id: &str) {
        if let Some(store) = self.store.as_ref() {
            let _renewal = self.renewal.lock();
            store.save(StoredSession { id: id.to_string(), last_activity_ms: self.clock.now_ms() });
        }
    }

    /// Drop the identity; the next read mints a new one.
    pub fn reset(&self) {
        self.clear();
    }

    /// Drop the identity without minting (sign-out).
    pub fn clear(&self) {
        if let Some(store) = self.store.as_ref() {
            let _renewal = self.renewal.lock();
            store.remove();
        }
    }

    pub fn peek(&self) -> Option<StoredSession> {
        self.store.as_ref().and_then(|s| s.load())
    }
}

fn mint() -> String {
    Uuid::new_v4().to_string()
}

/// Obtain (or create) a session id without a client, e.g. before `init`.
pub fn session_id(identity: &SessionIdentity) -> String {
    identity.get_or_create()
}
