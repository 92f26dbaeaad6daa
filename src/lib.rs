pub mod client;
pub mod config;
pub mod kernel;
pub mod services;

// Re-export specific items for convenient access
pub use client::TelemetryClient;
pub use config::{ConfigError, TelemetryConfig};
pub use kernel::batcher::{FlushMode, FlushOutcome};
pub use kernel::lifecycle::{ChannelLifecycle, HostLifecycle, LifecycleDriver, LifecycleSignal, ProcessLifecycle};
pub use kernel::session::{session_id, SessionIdentity, SessionStore, TabStore};
pub use kernel::telemetry::event::{AnalyticsEvent, BatchPayload, EventDraft};
pub use kernel::telemetry::metrics::DeliveryStats;
pub use kernel::time::{Clock, ManualClock, SystemClock};
pub use services::transport::{HttpTransport, SendOutcome, Transport, TransportError};
