#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use engage::{BatchPayload, ManualClock, SendOutcome, TelemetryClient, TelemetryConfig, Transport, TransportError};

/// Transport double: records every payload and replays scripted outcomes.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<BatchPayload>>,
    reliable: Mutex<Vec<BatchPayload>>,
    script: Mutex<VecDeque<SendOutcome>>,
    fail_reliable: Mutex<bool>,
    gate: Option<Arc<Notify>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sends block until `release` is called.
    pub fn gated() -> (Arc<Self>, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        (Arc::new(Self { gate: Some(gate.clone()), ..Self::default() }), gate)
    }

    pub fn then(&self, outcome: SendOutcome) {
        self.script.lock().push_back(outcome);
    }

    pub fn fail_reliable(&self) {
        *self.fail_reliable.lock() = true;
    }

    pub fn sent(&self) -> Vec<BatchPayload> {
        self.sent.lock().clone()
    }

    pub fn reliable(&self) -> Vec<BatchPayload> {
        self.reliable.lock().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, payload: &BatchPayload) -> SendOutcome {
        self.sent.lock().push(payload.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.script
            .lock()
            .pop_front()
            .unwrap_or(SendOutcome::Accepted(payload.events.len()))
    }

    async fn send_reliable(&self, payload: &BatchPayload) -> Result<(), TransportError> {
        self.reliable.lock().push(payload.clone());
        if *self.fail_reliable.lock() {
            return Err(TransportError::Status(503));
        }
        Ok(())
    }
}

pub const T0_MS: u64 = 1_700_000_000_000;

pub fn client_with(config: TelemetryConfig, transport: Arc<RecordingTransport>) -> (TelemetryClient, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(T0_MS));
    let client = TelemetryClient::with_clock(&config, transport, clock.clone()).unwrap();
    (client, clock)
}

pub fn client(transport: Arc<RecordingTransport>) -> (TelemetryClient, Arc<ManualClock>) {
    client_with(TelemetryConfig::default(), transport)
}

pub fn actions(events: &[engage::AnalyticsEvent]) -> Vec<String> {
    events.iter().map(|e| e.action.clone()).collect()
}
