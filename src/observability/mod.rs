//! Observability subsystem.
//!
//! Structured logging goes through `tracing` directly; the subscriber is
//! installed by the binary. This module holds the metric recorders.

pub mod metrics;
