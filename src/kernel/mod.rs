pub mod batcher;
pub mod lifecycle;
pub mod session;
pub mod telemetry;
pub mod time;
pub mod timers;
