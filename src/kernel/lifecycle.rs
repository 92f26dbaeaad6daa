use std::time::Duration;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::client::TelemetryClient;
use crate::kernel::batcher::FlushOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    /// Hidden but still alive (tab backgrounded, app suspended).
    Background,
    /// About to go away (page unload, process exit).
    Teardown,
}

/// Host-specific source of lifecycle signals.
#[async_trait]
pub trait HostLifecycle: Send {
    /// `None` means the host stopped reporting; treated as teardown.
    async fn next_signal(&mut self) -> Option<LifecycleSignal>;
}

/// Signals pushed by an embedding host over a channel.
pub struct ChannelLifecycle {
    rx: mpsc::Receiver<LifecycleSignal>,
}

impl ChannelLifecycle {
    pub fn channel(capacity: usize) -> (mpsc::Sender<LifecycleSignal>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }
}

#[async_trait]
impl HostLifecycle for ChannelLifecycle {
    async fn next_signal(&mut self) -> Option<LifecycleSignal> {
        self.rx.recv().await
    }
}

/// Native process: Ctrl-C is teardown.
#[derive(Debug, Default)]
pub struct ProcessLifecycle;

#[async_trait]
impl HostLifecycle for ProcessLifecycle {
    async fn next_signal(&mut self) -> Option<LifecycleSignal> {
        tokio::signal::ctrl_c().await.ok().map(|_| LifecycleSignal::Teardown)
    }
}

/// Periodic drain plus host signals.
pub struct LifecycleDriver {
    client: TelemetryClient,
    tick: Duration,
}

impl LifecycleDriver {
    pub fn new(client: TelemetryClient, tick: Duration) -> Self {
        Self { client, tick }
    }

    /// Runs until teardown, then performs the single reliable flush.
    pub async fn run<H: HostLifecycle>(self, mut host: H) -> FlushOutcome {
        info!("Lifecycle driver started. Tick: {:?}", self.tick);

        let mut cadence = interval(self.tick);
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // interval() fires immediately; the first drain is one full tick out.
        cadence.tick().await;

        loop {
            tokio::select! {
                _ = cadence.tick() => {
                    debug!("periodic flush");
                    self.client.flush_detached();
                }
                signal = host.next_signal() => match signal {
                    Some(LifecycleSignal::Background) => {
                        debug!("host backgrounded, flushing");
                        self.client.flush_detached();
                    }
                    Some(LifecycleSignal::Teardown) | None => break,
                },
            }
        }

        let outcome = self.client.flush_reliable().await;
        info!("Lifecycle driver stopped: {:?}", outcome);
        outcome
    }
}
