use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time delivery counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub tracked: u64,
    pub batches_sent: u64,
    pub events_accepted: u64,
    /// Rejected by the server as malformed; never retried.
    pub events_discarded: u64,
    /// Pushed past the retry cap during an outage.
    pub events_dropped: u64,
    pub events_requeued: u64,
    pub teardown_batches: u64,
}

#[derive(Debug, Default)]
pub struct DeliveryCounters {
    tracked: AtomicU64,
    batches_sent: AtomicU64,
    events_accepted: AtomicU64,
    events_discarded: AtomicU64,
    events_dropped: AtomicU64,
    events_requeued: AtomicU64,
    teardown_batches: AtomicU64,
}

impl DeliveryCounters {
    pub fn tracked(&self) {
        self.tracked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn accepted(&self, count: usize) {
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
        self.events_accepted.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn discarded(&self, count: usize) {
        self.events_discarded.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn requeued(&self, requeued: usize, dropped: usize) {
        self.events_requeued.fetch_add(requeued as u64, Ordering::Relaxed);
        self.events_dropped.fetch_add(dropped as u64, Ordering::Relaxed);
    }

    pub fn teardown(&self) {
        self.teardown_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DeliveryStats {
        DeliveryStats {
            tracked: self.tracked.load(Ordering::Relaxed),
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            events_accepted: self.events_accepted.load(Ordering::Relaxed),
            events_discarded: self.events_discarded.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            events_requeued: self.events_requeued.load(Ordering::Relaxed),
            teardown_batches: self.teardown_batches.load(Ordering::Relaxed),
        }
    }
}
