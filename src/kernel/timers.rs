use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::Mutex;
use tracing::debug;

use super::time::Clock;

/// Anything shorter is a scroll-through, not engagement.
pub const MIN_ENGAGEMENT_MS: u64 = 1_500;

/// Named start/stop timers for zone dwell time.
pub struct TimerRegistry {
    armed: Mutex<HashMap<String, u64>>,
    clock: Arc<dyn Clock>,
}

impl TimerRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { armed: Mutex::new(HashMap::new()), clock }
    }

    /// Arm `key`. A duplicate start keeps the original start time.
    pub fn start(&self, key: &str) {
        let now = self.clock.now_ms();
        self.armed.lock().entry(key.to_string()).or_insert(now);
    }

    /// Disarm `key` and return whole seconds elapsed, or `None` when the
    /// key was never armed or the dwell was under the engagement floor.
    pub fn stop(&self, key: &str) -> Option<u64> {
        let started_at = self.armed.lock().remove(key)?;
        let elapsed = self.clock.now_ms().saturating_sub(started_at);
        if elapsed < MIN_ENGAGEMENT_MS {
            debug!(key, elapsed_ms = elapsed, "dwell below engagement floor");
            return None;
        }
        Some(elapsed / 1000)
    }

    pub fn is_armed(&self, key: &str) -> bool {
        self.armed.lock().contains_key(key)
    }

    pub fn armed_count(&self) -> usize {
        self.armed.lock().len()
    }
}
