use std::sync::Arc;

use crate::config::{ConfigError, TelemetryConfig};
use crate::kernel::batcher::{Batcher, FlushMode, FlushOutcome};
use crate::kernel::session::{SessionIdentity, SessionStore, TabStore};
use crate::kernel::telemetry::event::{AnalyticsEvent, EventDraft};
use crate::kernel::telemetry::metrics::DeliveryStats;
use crate::kernel::time::{Clock, SystemClock};
use crate::kernel::timers::TimerRegistry;
use crate::services::transport::Transport;

/// One telemetry pipeline per visit, owned by the host's composition root.
///
/// Cheap to clone; clones share the same queue, timers and session.
#[derive(Clone)]
pub struct TelemetryClient {
    batcher: Batcher,
    timers: Arc<TimerRegistry>,
    sessions: Arc<SessionIdentity>,
}

impl TelemetryClient {
    pub fn new(config: &TelemetryConfig, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        Self::with_clock(config, transport, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: &TelemetryConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let sessions = SessionIdentity::new(Box::new(TabStore::new()), clock.clone());
        Self::from_parts(config, transport, clock, sessions)
    }

    pub fn with_session_store(
        config: &TelemetryConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        store: Box<dyn SessionStore>,
    ) -> Result<Self, ConfigError> {
        let sessions = SessionIdentity::new(store, clock.clone());
        Self::from_parts(config, transport, clock, sessions)
    }

    pub fn from_parts(
        config: &TelemetryConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        sessions: SessionIdentity,
    ) -> Result<Self, ConfigError> {
        // Deserialized configs bypass `from_env`; a zero batch size or cap
        // would flush on every event or drop every retry.
        config.validate()?;

        let sessions = Arc::new(sessions);
        Ok(Self {
            batcher: Batcher::new(config, transport, sessions.clone(), clock.clone()),
            timers: Arc::new(TimerRegistry::new(clock)),
            sessions,
        })
    }

    pub fn init(&self, session_id: &str, user_id: Option<String>) {
        self.batcher.init(session_id, user_id);
    }

    pub fn is_initialized(&self) -> bool {
        self.batcher.is_initialized()
    }

    pub fn track(&self, event: EventDraft) {
        self.batcher.track(event);
    }

    pub fn start_timer(&self, key: &str) {
        self.timers.start(key);
    }

    pub fn stop_timer(&self, key: &str) -> Option<u64> {
        self.timers.stop(key)
    }

    /// Stop the zone timer and, if the dwell counts as engagement, queue a
    /// `zone_dwell` event for it.
    pub fn stop_zone(&self, page: &str, zone: &str) -> Option<u64> {
        let seconds = self.timers.stop(zone)?;
        self.track(EventDraft::dwell(page, zone, seconds));
        Some(seconds)
    }

    pub async fn flush(&self) -> FlushOutcome {
        self.batcher.flush(FlushMode::Normal).await
    }

    pub async fn flush_reliable(&self) -> FlushOutcome {
        self.batcher.flush(FlushMode::Reliable).await
    }

    /// Start a normal flush without waiting on it.
    pub fn flush_detached(&self) {
        self.batcher.flush_detached(FlushMode::Normal);
    }

    pub fn update_user_id(&self, user_id: Option<String>) {
        self.batcher.update_user_id(user_id);
    }

    pub fn user_id(&self) -> Option<String> {
        self.batcher.user_id()
    }

    /// Start a fresh session; returns the new id.
    pub fn reset_session(&self) -> String {
        self.sessions.reset();
        self.sessions.get_or_create()
    }

    /// Forget the session without minting a replacement (sign-out).
    pub fn clear_session(&self) {
        self.sessions.clear();
    }

    /// Current session id, minting one if needed. Usable before `init`.
    pub fn session_id(&self) -> String {
        self.sessions.get_or_create()
    }

    pub fn is_flush_scheduled(&self) -> bool {
        self.batcher.is_flush_scheduled()
    }

    pub fn pending(&self) -> usize {
        self.batcher.pending()
    }

    pub fn queued_events(&self) -> Vec<AnalyticsEvent> {
        self.batcher.queued_events()
    }

    pub fn stats(&self) -> DeliveryStats {
        self.batcher.stats()
    }
}
