//! Reading and writing the configuration file.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::error::StoreError;
use crate::format::{self, Format};

/// Where and how the store persists itself.
#[derive(Debug, Clone)]
pub struct PersistenceTarget {
    path: PathBuf,
    format_id: String,
    format: Arc<dyn Format>,
}

impl PersistenceTarget {
    /// Target using a format from the built-in registry.
    pub fn new(path: impl AsRef<Path>, format_id: &str) -> Self {
        Self::with_format(path, format_id, format::resolve(format_id))
    }

    /// Target using an explicitly resolved format.
    pub fn with_format(path: impl AsRef<Path>, format_id: &str, format: Arc<dyn Format>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            format_id: format_id.to_string(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The identifier the target was configured with, as given.
    pub fn format_id(&self) -> &str {
        &self.format_id
    }

    pub fn format(&self) -> &Arc<dyn Format> {
        &self.format
    }

    /// True when the file extension is not one the format claims.
    ///
    /// A path without an extension never mismatches.
    pub fn extension_mismatch(&self) -> bool {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => !self
                .format
                .extensions()
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }

    fn warn_on_mismatch(&self) {
        if self.extension_mismatch() {
            tracing::warn!(
                path = %self.path.display(),
                format = self.format.name(),
                "Format does not match file extension"
            );
        }
    }

    /// Read and decode the whole file. An empty or `null` document is `{}`.
    pub fn read_mapping(&self) -> Result<Map<String, Value>, StoreError> {
        Ok(self.read_document()?.unwrap_or_default())
    }

    /// Read and decode the whole file, `None` for a `null` document.
    pub fn read_document(&self) -> Result<Option<Map<String, Value>>, StoreError> {
        self.warn_on_mismatch();

        let file = File::open(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        let value = self
            .format
            .decode_reader(&mut reader)
            .map_err(|source| StoreError::Decode {
                path: self.path.clone(),
                source,
            })?;

        match value {
            Value::Object(map) => Ok(Some(map)),
            Value::Null => Ok(None),
            _ => Err(StoreError::NotAMapping {
                path: self.path.clone(),
            }),
        }
    }

    /// Encode `map` and overwrite the file.
    ///
    /// Encoding happens before the file is truncated, so an encode failure
    /// leaves the previous file in place.
    pub fn write_mapping(&self, map: &Map<String, Value>) -> Result<(), StoreError> {
        self.warn_on_mismatch();

        let value = Value::Object(map.clone());
        let mut encoded = Vec::new();
        self.format
            .encode_writer(&value, &mut encoded)
            .map_err(StoreError::Encode)?;

        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        let file = File::create(&self.path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&encoded).map_err(write_err)?;
        writer.flush().map_err(write_err)?;
        Ok(())
    }

    pub fn exists(&self) -> bool {
        fs::metadata(&self.path).is_ok()
    }
}
