//! Configuration store subsystem.
//!
//! # Data Flow
//! ```text
//! config file (YAML/JSON/TOML)
//!     → persistence.rs (read & decode via a Format)
//!     → store.rs (ConfigStore, guarded in-memory mapping)
//!     → callers: get / at / set / update / merge_into
//!     → persistence.rs (encode & overwrite on save)
//!
//! On file change (optional):
//!     watcher.rs detects change
//!     → store.reload() replaces the mapping, or keeps it on failure
//! ```
//!
//! # Design Decisions
//! - The top-level value is always a mapping
//! - Keyed reads fall back to a weakly held host source
//! - Merges report flattened `a.b.c` paths and never auto-save

pub mod error;
pub mod fallback;
pub mod merge;
pub mod persistence;
pub mod store;
pub mod watcher;

pub use error::StoreError;
pub use fallback::Fallback;
pub use merge::{merge_maps, Change, ChangeSet};
pub use persistence::PersistenceTarget;
pub use store::{ConfigStore, ConfigStoreBuilder};
pub use watcher::ConfigWatcher;
