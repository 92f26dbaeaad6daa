//! Event telemetry pipeline.
//!
//! # PRIVACY INVARIANT
//! Payloads must **NEVER** carry a user identifier. The session id is the only
//! correlation key on the wire; identity rides as a transport credential.
//!
//! # DELIVERY INVARIANT
//! A flush drains the whole live queue under one lock before any I/O, so a
//! batch is handed to the transport at most once per attempt.

pub mod event;
pub mod metrics;
pub mod recorder;
