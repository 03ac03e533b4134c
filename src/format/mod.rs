//! Serialization formats for configuration files.
//!
//! # Data Flow
//! ```text
//! format identifier ("yml", "yaml", "json", "toml", "")
//!     → registry.rs (resolve, default "yml")
//!     → Arc<dyn Format>
//!     → decode file bytes into a serde_json::Value
//!     → encode the in-memory mapping back to bytes or a string
//! ```
//!
//! # Design Decisions
//! - Every codec goes through `serde_json::Value` so all formats share one value model
//! - Unknown identifiers never fail; they resolve to YAML
//! - Codecs are trait objects so hosts can register their own

pub mod json;
pub mod registry;
pub mod toml;
pub mod yaml;

use std::io::{Read, Write};

use serde_json::Value;
use thiserror::Error;

pub use json::Json;
pub use registry::{resolve, FormatRegistry, DEFAULT_FORMAT};
pub use self::toml::Toml;
pub use yaml::Yaml;

/// Error produced by a codec.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("toml decode: {0}")]
    TomlDecode(#[from] ::toml::de::Error),

    #[error("toml encode: {0}")]
    TomlEncode(#[from] ::toml::ser::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// A codec converting between configuration values and text.
pub trait Format: Send + Sync {
    /// Canonical identifier, e.g. `"yml"`.
    fn name(&self) -> &'static str;

    /// File extensions (without the dot) this format considers native.
    fn extensions(&self) -> &'static [&'static str];

    fn decode_reader(&self, reader: &mut dyn Read) -> Result<Value, FormatError>;

    fn decode_str(&self, input: &str) -> Result<Value, FormatError>;

    fn encode_writer(&self, value: &Value, writer: &mut dyn Write) -> Result<(), FormatError>;

    fn encode_string(&self, value: &Value) -> Result<String, FormatError>;
}

impl std::fmt::Debug for dyn Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Format").field("name", &self.name()).finish()
    }
}
