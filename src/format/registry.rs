//! Format lookup by identifier.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use super::{Format, Json, Toml, Yaml};

/// Identifier used whenever a lookup misses.
pub const DEFAULT_FORMAT: &str = "yml";

/// Maps format identifiers to codecs.
///
/// Lookups never fail: empty or unknown identifiers resolve to
/// [`DEFAULT_FORMAT`]. Identifiers are trimmed and matched case-insensitively.
#[derive(Clone)]
pub struct FormatRegistry {
    formats: HashMap<String, Arc<dyn Format>>,
}

impl FormatRegistry {
    /// Registry with `yml`, `yaml`, `json` and `toml`.
    pub fn new() -> Self {
        let yaml: Arc<dyn Format> = Arc::new(Yaml);
        let mut registry = Self {
            formats: HashMap::new(),
        };
        registry.register("yml", yaml.clone());
        registry.register("yaml", yaml);
        registry.register("json", Arc::new(Json));
        registry.register("toml", Arc::new(Toml));
        registry
    }

    /// Add or replace the codec behind `id`.
    pub fn register(&mut self, id: &str, format: Arc<dyn Format>) {
        self.formats.insert(normalize(id), format);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.formats.contains_key(&normalize(id))
    }

    /// Resolve `id`, falling back to the default format.
    pub fn resolve(&self, id: &str) -> Arc<dyn Format> {
        if let Some(format) = self.formats.get(&normalize(id)) {
            return format.clone();
        }
        if !id.trim().is_empty() {
            tracing::debug!(
                format = %id,
                default = DEFAULT_FORMAT,
                "Unknown format, using default"
            );
        }
        self.formats
            .get(DEFAULT_FORMAT)
            .cloned()
            .unwrap_or_else(|| Arc::new(Yaml))
    }

    /// Registered identifiers, sorted.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.formats.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("formats", &self.identifiers())
            .finish()
    }
}

fn normalize(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

/// Resolve against the built-in registry.
pub fn resolve(id: &str) -> Arc<dyn Format> {
    static BUILTIN: OnceLock<FormatRegistry> = OnceLock::new();
    BUILTIN.get_or_init(FormatRegistry::new).resolve(id)
}
