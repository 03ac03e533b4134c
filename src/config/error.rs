use std::path::PathBuf;

use thiserror::Error;

use crate::format::FormatError;

/// Errors produced by the configuration store.
///
/// Only [`StoreError::KeyNotFound`] is returned by keyed reads; the rest come
/// from persistence and are also logged where they happen.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write config file '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode config file '{path}': {source}")]
    Decode {
        path: PathBuf,
        source: FormatError,
    },

    #[error("failed to encode configuration: {0}")]
    Encode(FormatError),

    #[error("config file '{path}' does not contain a mapping")]
    NotAMapping { path: PathBuf },

    #[error("config file '{path}' is empty")]
    EmptyDocument { path: PathBuf },

    #[error("no persistence target configured")]
    NoPersistenceTarget,

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}
