//! Live, layered configuration store with an HTTP read endpoint.
//!
//! A [`ConfigStore`] holds a mapping loaded from a YAML, JSON or TOML file,
//! merges new data into it while reporting each change, and persists writes.
//! [`ConfigLayer`] wraps a host's service so `GET /config/` returns the
//! current configuration and every other request goes to the host.

pub mod config;
pub mod format;
pub mod http;
pub mod observability;

pub use config::{Change, ChangeSet, ConfigStore, ConfigWatcher, Fallback, StoreError};
pub use format::{Format, FormatRegistry};
pub use http::{ConfigHandle, ConfigLayer, ConfigService, HttpServer};
