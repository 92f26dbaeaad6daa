use std::sync::{Arc, Weak};
use std::time::Duration;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::TelemetryConfig;
use crate::services::transport::{SendOutcome, Transport};
use super::session::SessionIdentity;
use super::telemetry::event::{AnalyticsEvent, BatchPayload, EventDraft};
use super::telemetry::metrics::{DeliveryCounters, DeliveryStats};
use super::telemetry::recorder::EventQueue;
use super::time::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushMode {
    /// Retryable send with requeue on transient failure.
    Normal,
    /// One unload-safe attempt at teardown. Failures are swallowed.
    Reliable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Batcher not initialized yet.
    Skipped,
    /// Nothing buffered, no I/O performed.
    Empty,
    Delivered(usize),
    /// Rejected as malformed and dropped for good.
    Discarded(usize),
    Requeued { requeued: usize, dropped: usize },
    /// Handed to the teardown send; its result is not observed.
    Teardown(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Uninitialized,
    Armed { user_id: Option<String> },
}

struct BatcherState {
    phase: Phase,
    queue: EventQueue,
    debounce: Option<JoinHandle<()>>,
}

struct Inner {
    state: Mutex<BatcherState>,
    transport: Arc<dyn Transport>,
    sessions: Arc<SessionIdentity>,
    clock: Arc<dyn Clock>,
    counters: DeliveryCounters,
    batch_size: usize,
    retry_cap: usize,
    debounce: Duration,
}

/// Event queue with size and quiet-period flush triggers.
///
/// The state lock is only ever held for synchronous work. A flush swaps the
/// whole queue out under the lock before touching the network, so concurrent
/// flush triggers cannot hand the same events to the transport twice.
#[derive(Clone)]
pub struct Batcher {
    inner: Arc<Inner>,
}

impl Batcher {
    pub fn new(
        config: &TelemetryConfig,
        transport: Arc<dyn Transport>,
        sessions: Arc<SessionIdentity>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(BatcherState {
                    phase: Phase::Uninitialized,
                    queue: EventQueue::new(),
                    debounce: None,
                }),
                transport,
                sessions,
                clock,
                counters: DeliveryCounters::default(),
                batch_size: config.batch_size,
                retry_cap: config.retry_cap,
                debounce: Duration::from_secs(config.flush_interval_secs),
            }),
        }
    }

    pub fn init(&self, session_id: &str, user_id: Option<String>) {
        self.inner.sessions.adopt(session_id);
        self.inner.state.lock().phase = Phase::Armed { user_id };
        info!(session_id, "telemetry initialized");
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.state.lock().phase != Phase::Uninitialized
    }

    pub fn update_user_id(&self, user_id: Option<String>) {
        let mut state = self.inner.state.lock();
        match &mut state.phase {
            Phase::Armed { user_id: slot } => *slot = user_id,
            Phase::Uninitialized => warn!("update_user_id called before init; ignored"),
        }
    }

    pub fn user_id(&self) -> Option<String> {
        match &self.inner.state.lock().phase {
            Phase::Armed { user_id } => user_id.clone(),
            Phase::Uninitialized => None,
        }
    }

    pub fn track(&self, draft: EventDraft) {
        let mut state = self.inner.state.lock();
        if state.phase == Phase::Uninitialized {
            warn!(action = %draft.action, "track called before init; event dropped");
            return;
        }

        let event = draft.stamp(self.inner.clock.now_secs());
        debug!(action = %event.action, page = %event.page, "event queued");
        let len = state.queue.push(event);
        self.inner.counters.tracked();

        if len >= self.inner.batch_size {
            if let Some(pending) = state.debounce.take() {
                pending.abort();
            }
            drop(state);
            self.flush_detached(FlushMode::Normal);
        } else {
            self.arm_debounce(&mut state);
        }
    }

    /// Fire a flush without waiting for it.
    pub fn flush_detached(&self, mode: FlushMode) {
        match Handle::try_current() {
            Ok(handle) => {
                let batcher = self.clone();
                handle.spawn(async move {
                    batcher.flush(mode).await;
                });
            }
            Err(_) => warn!("no async runtime; flush deferred to the next trigger"),
        }
    }

    pub async fn flush(&self, mode: FlushMode) -> FlushOutcome {
        let batch = {
            let mut state = self.inner.state.lock();
            if state.phase == Phase::Uninitialized {
                warn!("flush called before init; ignored");
                return FlushOutcome::Skipped;
            }
            if let Some(pending) = state.debounce.take() {
                pending.abort();
            }
            if state.queue.is_empty() {
                return FlushOutcome::Empty;
            }
            state.queue.drain_all()
        };

        let payload = BatchPayload {
            session_id: self.inner.sessions.get_or_create(),
            events: batch,
        };

        match mode {
            FlushMode::Normal => self.deliver(payload).await,
            FlushMode::Reliable => {
                let count = payload.events.len();
                self.inner.counters.teardown();
                if let Err(e) = self.inner.transport.send_reliable(&payload).await {
                    debug!("teardown send failed: {}", e);
                }
                FlushOutcome::Teardown(count)
            }
        }
    }

    async fn deliver(&self, payload: BatchPayload) -> FlushOutcome {
        let count = payload.events.len();

        match self.inner.transport.send(&payload).await {
            SendOutcome::Accepted(stored) => {
                self.inner.counters.accepted(stored);
                info!(session_id = %payload.session_id, sent = count, stored, "batch delivered");
                FlushOutcome::Delivered(count)
            }
            SendOutcome::ClientError(details) => {
                self.inner.counters.discarded(count);
                warn!(discarded = count, "batch rejected, not retrying: {}", details);
                FlushOutcome::Discarded(count)
            }
            SendOutcome::Transient(reason) => {
                let mut state = self.inner.state.lock();
                let dropped = state.queue.requeue_front(payload.events, self.inner.retry_cap);
                self.inner.counters.requeued(count, dropped);
                if dropped > 0 {
                    warn!(dropped, cap = self.inner.retry_cap, "retry buffer full, oldest events dropped");
                }
                debug!(requeued = count, "delivery failed, batch requeued: {}", reason);
                self.arm_debounce(&mut state);
                FlushOutcome::Requeued { requeued: count, dropped }
            }
        }
    }

    fn arm_debounce(&self, state: &mut BatcherState) {
        if let Some(pending) = state.debounce.take() {
            pending.abort();
        }
        let Ok(handle) = Handle::try_current() else {
            return;
        };

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let delay = self.inner.debounce;
        // The flush runs in its own task so a later re-arm cannot abort an
        // in-flight send.
        state.debounce = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                Batcher { inner }.flush_detached(FlushMode::Normal);
            }
        }));
    }

    /// A quiet-period flush is armed and has not fired yet.
    pub fn is_flush_scheduled(&self) -> bool {
        self.inner
            .state
            .lock()
            .debounce
            .as_ref()
            .is_some_and(|pending| !pending.is_finished())
    }

    pub fn pending(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    pub fn queued_events(&self) -> Vec<AnalyticsEvent> {
        self.inner.state.lock().queue.snapshot()
    }

    pub fn stats(&self) -> DeliveryStats {
        self.inner.counters.snapshot()
    }
}
