//! Delivery transport: one logical request, two delivery strategies.

pub mod client;
pub mod identity;

use std::time::Duration;
use async_trait::async_trait;
use thiserror::Error;

use crate::kernel::telemetry::event::BatchPayload;

pub use client::HttpTransport;
pub use identity::{AnonymousIdentity, Identity, IdentityProvider, StaticIdentity};

/// Result of a retryable send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Server accepted the batch and reported how many events it stored.
    Accepted(usize),
    /// Server rejected the payload shape. Retrying repeats the rejection.
    ClientError(String),
    /// Network, timeout or server fault. Worth retrying.
    Transient(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ingestion endpoint answered {0}")]
    Status(u16),

    #[error("no answer within {0:?}")]
    Timeout(Duration),

    #[error("could not encode batch: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid ingestion url: {0}")]
    InvalidUrl(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Normal-mode send, bounded by the ambient request timeout.
    async fn send(&self, payload: &BatchPayload) -> SendOutcome;

    /// Teardown-mode send. Attempted once; the caller swallows any error.
    async fn send_reliable(&self, payload: &BatchPayload) -> Result<(), TransportError>;
}

/// Accepts and forgets every batch. For hosts with telemetry switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTransport;

#[async_trait]
impl Transport for NoopTransport {
    async fn send(&self, payload: &BatchPayload) -> SendOutcome {
        SendOutcome::Accepted(payload.events.len())
    }

    async fn send_reliable(&self, _payload: &BatchPayload) -> Result<(), TransportError> {
        Ok(())
    }
}
