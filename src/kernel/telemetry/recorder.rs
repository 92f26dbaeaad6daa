use std::collections::VecDeque;
use super::event::AnalyticsEvent;

/// Live event buffer owned by the batcher.
#[derive(Debug, Default)]
pub struct EventQueue {
    buffer: VecDeque<AnalyticsEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: AnalyticsEvent) -> usize {
        self.buffer.push_back(event);
        self.buffer.len()
    }

    /// Move everything out, leaving the live queue empty.
    pub fn drain_all(&mut self) -> Vec<AnalyticsEvent> {
        std::mem::take(&mut self.buffer).into()
    }

    /// Put a failed batch back ahead of anything enqueued since, then trim
    /// the oldest entries down to `cap`. Returns how many were dropped.
    pub fn requeue_front(&mut self, batch: Vec<AnalyticsEvent>, cap: usize) -> usize {
        for event in batch.into_iter().rev() {
            self.buffer.push_front(event);
        }
        let overflow = self.buffer.len().saturating_sub(cap);
        self.buffer.drain(..overflow);
        overflow
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn snapshot(&self) -> Vec<AnalyticsEvent> {
        self.buffer.iter().cloned().collect()
    }
}
