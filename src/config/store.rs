//! The live configuration store.

use std::fmt;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use serde_json::{Map, Value};

use crate::config::error::StoreError;
use crate::config::fallback::Fallback;
use crate::config::merge::{merge_maps, ChangeSet};
use crate::config::persistence::PersistenceTarget;
use crate::format::Format;
use crate::observability::metrics;

/// A mutable, optionally file-backed configuration mapping.
///
/// One `RwLock` guards `current`. Mutations (`load`, `reload`, `save`, `set`,
/// `update`, `merge_into`) take the write side and reads take the read side,
/// so no caller ever sees a half-applied change. Persistence I/O happens while
/// the write side is held, which makes `set` and its save one atomic unit.
pub struct ConfigStore {
    current: RwLock<Map<String, Value>>,
    persistence: Option<PersistenceTarget>,
    fallback: Option<Weak<dyn Fallback>>,
}

impl ConfigStore {
    /// In-memory store with no file and no fallback.
    pub fn new(initial: Map<String, Value>) -> Self {
        Self {
            current: RwLock::new(initial),
            persistence: None,
            fallback: None,
        }
    }

    pub fn builder() -> ConfigStoreBuilder {
        ConfigStoreBuilder::default()
    }

    pub fn persistence(&self) -> Option<&PersistenceTarget> {
        self.persistence.as_ref()
    }

    /// Replace `current` with the contents of the persistence file.
    ///
    /// Without a target `current` becomes empty. Any failure also leaves
    /// `current` empty; the error is logged and also returned. Use [`reload`]
    /// to keep the previous state instead.
    ///
    /// [`reload`]: ConfigStore::reload
    pub fn load(&self) -> Result<(), StoreError> {
        let mut current = self.write();
        let Some(target) = &self.persistence else {
            current.clear();
            return Ok(());
        };

        match target.read_mapping() {
            Ok(map) => {
                tracing::info!(path = %target.path().display(), keys = map.len(), "Loaded config");
                metrics::record_load("ok");
                *current = map;
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    path = %target.path().display(),
                    error = %e,
                    "Couldn't load config file, starting empty"
                );
                metrics::record_load("error");
                current.clear();
                Err(e)
            }
        }
    }

    /// Like [`load`](ConfigStore::load), but a failure keeps the current state.
    ///
    /// An empty or `null` document counts as a failure here, since a file
    /// caught mid-write reads that way.
    pub fn reload(&self) -> Result<(), StoreError> {
        let target = self
            .persistence
            .as_ref()
            .ok_or(StoreError::NoPersistenceTarget)?;

        let mut current = self.write();
        let document = target.read_document().and_then(|doc| {
            doc.ok_or_else(|| StoreError::EmptyDocument {
                path: target.path().to_path_buf(),
            })
        });
        match document {
            Ok(map) => {
                tracing::info!(
                    path = %target.path().display(),
                    keys = map.len(),
                    "Reloaded config"
                );
                metrics::record_load("ok");
                *current = map;
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    path = %target.path().display(),
                    error = %e,
                    "Failed to reload config. Keeping current configuration."
                );
                metrics::record_load("error");
                Err(e)
            }
        }
    }

    /// Write the whole mapping to the persistence file, if there is one.
    ///
    /// A failure is logged and returned; in-memory state is untouched.
    pub fn save(&self) -> Result<(), StoreError> {
        let current = self.write();
        self.persist(&current)
    }

    /// Local-only read with a default. Never consults the fallback.
    pub fn get(&self, key: &str, default: Value) -> Value {
        self.lookup(key).unwrap_or(default)
    }

    /// Local-only read.
    pub fn lookup(&self, key: &str) -> Option<Value> {
        self.read().get(key).cloned()
    }

    /// Keyed read: `current`, then the fallback, else `KeyNotFound`.
    pub fn at(&self, key: &str) -> Result<Value, StoreError> {
        if let Some(value) = self.lookup(key) {
            return Ok(value);
        }
        self.fallback_lookup(key)
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
    }

    fn fallback_lookup(&self, key: &str) -> Option<Value> {
        let weak = self.fallback.as_ref()?;
        match weak.upgrade() {
            Some(fallback) => fallback.lookup(key),
            None => {
                tracing::debug!(key, "Fallback source has been dropped");
                None
            }
        }
    }

    /// Set `key` and, with a persistence target, save before returning.
    ///
    /// Returns the previous value. Save failures are logged, not returned.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        let mut current = self.write();
        let previous = current.insert(key.into(), value);
        let _ = self.persist(&current);
        previous
    }

    /// Mutate the mapping in place under the guard, then auto-save like `set`.
    ///
    /// The write guard is held while `f` runs and the lock is not reentrant:
    /// calling any method of this store from inside `f` deadlocks.
    pub fn update<R>(&self, f: impl FnOnce(&mut Map<String, Value>) -> R) -> R {
        let mut current = self.write();
        let result = f(&mut *current);
        let _ = self.persist(&current);
        result
    }

    /// Recursively merge `incoming` into `current`.
    ///
    /// Does not save; call [`save`](ConfigStore::save) afterwards if wanted.
    pub fn merge_into(&self, incoming: &Map<String, Value>) -> ChangeSet {
        let changes = merge_maps(&mut *self.write(), incoming);
        tracing::debug!(changes = changes.len(), "Merged configuration");
        metrics::record_merge(changes.len());
        changes
    }

    /// Point-in-time copy of `current`.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.read().clone()
    }

    /// Compact JSON of `current`, encoded under the read guard.
    pub fn to_json(&self) -> String {
        let current = self.read();
        // Maps with string keys always serialize.
        serde_json::to_string(&*current).unwrap_or_else(|_| String::from("{}"))
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    fn persist(&self, current: &Map<String, Value>) -> Result<(), StoreError> {
        let Some(target) = &self.persistence else {
            return Ok(());
        };
        match target.write_mapping(current) {
            Ok(()) => {
                tracing::info!(path = %target.path().display(), "Saved config");
                metrics::record_save("ok");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    path = %target.path().display(),
                    error = %e,
                    "Failed to save config"
                );
                metrics::record_save("error");
                Err(e)
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Map<String, Value>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Map<String, Value>> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(Map::new())
    }
}

impl Fallback for ConfigStore {
    fn lookup(&self, key: &str) -> Option<Value> {
        ConfigStore::lookup(self, key)
    }
}

impl PartialEq<Map<String, Value>> for ConfigStore {
    fn eq(&self, other: &Map<String, Value>) -> bool {
        *self.read() == *other
    }
}

impl fmt::Display for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("current", &*self.read())
            .field("persistence", &self.persistence)
            .field("has_fallback", &self.fallback.is_some())
            .finish()
    }
}

/// Builder for [`ConfigStore`].
#[derive(Default)]
pub struct ConfigStoreBuilder {
    defaults: Map<String, Value>,
    persistence: Option<PersistenceTarget>,
    fallback: Option<Weak<dyn Fallback>>,
}

impl ConfigStoreBuilder {
    /// Values to start with. Replaced by the file contents when a file is set.
    pub fn defaults(mut self, defaults: Map<String, Value>) -> Self {
        self.defaults = defaults;
        self
    }

    /// Persist to `path` using the format registered under `format_id`.
    pub fn file(mut self, path: impl AsRef<Path>, format_id: &str) -> Self {
        self.persistence = Some(PersistenceTarget::new(path, format_id));
        self
    }

    /// Persist to `path` with an already resolved format.
    pub fn file_with_format(
        mut self,
        path: impl AsRef<Path>,
        format_id: &str,
        format: Arc<dyn Format>,
    ) -> Self {
        self.persistence = Some(PersistenceTarget::with_format(path, format_id, format));
        self
    }

    /// Consult `fallback` on keyed-read misses. Only a weak reference is kept.
    pub fn fallback<F: Fallback + 'static>(mut self, fallback: &Arc<F>) -> Self {
        let weak: Weak<dyn Fallback> = Arc::downgrade(fallback) as Weak<dyn Fallback>;
        self.fallback = Some(weak);
        self
    }

    /// Build the store, loading the file if one was configured.
    ///
    /// A failed load is logged and leaves the store empty.
    pub fn build(self) -> ConfigStore {
        let store = ConfigStore {
            current: RwLock::new(self.defaults),
            persistence: self.persistence,
            fallback: self.fallback,
        };
        if store.persistence.is_some() {
            // Already logged by load.
            let _ = store.load();
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::thread;
    use tempfile::TempDir;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not a mapping: {other}"),
        }
    }

    fn sample() -> Map<String, Value> {
        map(json!({"a": 1, "b": {"c": 3, "d": [true]}}))
    }

    #[test]
    fn test_keyed_read() {
        let store = ConfigStore::new(sample());

        assert_eq!(store.at("a").unwrap(), json!(1));
        assert_eq!(store.at("b").unwrap()["d"], json!([true]));
        assert!(matches!(store.at("e"), Err(StoreError::KeyNotFound(k)) if k == "e"));
    }

    #[test]
    fn test_get_with_default() {
        let store = ConfigStore::new(sample());

        assert_eq!(store.get("a", json!(10)), json!(1));
        assert_eq!(store.get("e", json!(10)), json!(10));
        assert_eq!(store.get("b", Value::Null)["d"], json!([true]));
    }

    #[test]
    fn test_fallback_consulted_on_miss() {
        let host = Arc::new(map(json!({"DEBUG": true, "a": "shadowed"})));
        let store = ConfigStore::builder()
            .defaults(sample())
            .fallback(&host)
            .build();

        assert_eq!(store.at("DEBUG").unwrap(), json!(true));
        assert_eq!(store.at("a").unwrap(), json!(1));
        assert!(store.at("missing").is_err());
        // get stays local
        assert_eq!(store.get("DEBUG", json!(false)), json!(false));
    }

    #[test]
    fn test_dropped_fallback_is_ignored() {
        let host = Arc::new(HashMap::from([("DEBUG".to_string(), json!(true))]));
        let store = ConfigStore::builder().fallback(&host).build();
        assert_eq!(store.at("DEBUG").unwrap(), json!(true));

        drop(host);
        assert!(matches!(store.at("DEBUG"), Err(StoreError::KeyNotFound(_))));
    }

    #[test]
    fn test_fallback_sees_host_updates() {
        let host = Arc::new(RwLock::new(Map::new()));
        let store = ConfigStore::builder().fallback(&host).build();
        assert!(store.at("late").is_err());

        host.write().unwrap().insert("late".into(), json!("arrived"));
        assert_eq!(store.at("late").unwrap(), json!("arrived"));
    }

    #[test]
    fn test_set_and_update() {
        let store = ConfigStore::new(map(json!({"a": 1, "b": {"c": "3"}})));

        store.update(|current| {
            if let Some(Value::Object(b)) = current.get_mut("b") {
                b.insert("e".into(), json!(10));
            }
        });
        assert_eq!(store.set("d", json!({"r": {"a": [true]}})), None);
        assert_eq!(store.set("a", json!(2)), Some(json!(1)));

        assert!(store == map(json!({
            "a": 2,
            "b": {"c": "3", "e": 10},
            "d": {"r": {"a": [true]}}
        })));
    }

    #[test]
    fn test_merge_into_store() {
        let store = ConfigStore::new(map(json!({"a": 1, "b": {"c": [true]}})));
        let changes = store.merge_into(&map(json!({"b": {"d": "x"}})));

        assert_eq!(changes.len(), 1);
        assert!(changes.get("b.d").unwrap().is_addition());
        assert_eq!(store.snapshot(), map(json!({"a": 1, "b": {"c": [true], "d": "x"}})));
    }

    #[test]
    fn test_merge_does_not_persist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf.yml");
        let store = ConfigStore::builder().file(&path, "yml").build();

        store.merge_into(&map(json!({"a": 1})));
        assert!(!path.exists());

        store.save().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::builder()
            .defaults(sample())
            .file(dir.path().join("nope.yml"), "yml")
            .build();

        assert!(store.is_empty());
        assert!(matches!(store.load(), Err(StoreError::Read { .. })));
    }

    #[test]
    fn test_reload_keeps_state_on_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf.json");
        let store = ConfigStore::builder().file(&path, "json").build();

        store.set("kept", json!(true));
        std::fs::write(&path, "{ broken").unwrap();

        assert!(matches!(store.reload(), Err(StoreError::Decode { .. })));
        assert_eq!(store.lookup("kept"), Some(json!(true)));
    }

    #[test]
    fn test_reload_without_target() {
        let store = ConfigStore::new(map(json!({"a": 1})));
        assert!(matches!(store.reload(), Err(StoreError::NoPersistenceTarget)));
        assert_eq!(store.lookup("a"), Some(json!(1)));

        assert!(store.save().is_ok());
        assert!(store.load().is_ok());
        assert!(store.is_empty());
    }

    #[test]
    fn test_builder_without_file_keeps_defaults() {
        let store = ConfigStore::builder().defaults(sample()).build();
        assert_eq!(store.snapshot(), sample());
    }

    #[test]
    fn test_reload_keeps_state_on_empty_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf.yml");
        let store = ConfigStore::builder().file(&path, "yml").build();
        store.set("keep", json!(true));

        std::fs::write(&path, "").unwrap();
        assert!(store.reload().is_err());
        assert_eq!(store.lookup("keep"), Some(json!(true)));

        std::fs::write(&path, "~\n").unwrap();
        assert!(matches!(store.reload(), Err(StoreError::EmptyDocument { .. })));
        assert_eq!(store.lookup("keep"), Some(json!(true)));
    }

    #[test]
    fn test_set_persists_before_returning() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf.json");
        let store = ConfigStore::builder().file(&path, "json").build();

        store.set("port", json!(8080));

        let on_disk = std::fs::read_to_string(&path).unwrap();
        let on_disk: Value = serde_json::from_str(&on_disk).unwrap();
        assert_eq!(on_disk, json!({"port": 8080}));
    }

    #[test]
    fn test_save_failure_keeps_memory() {
        let dir = TempDir::new().unwrap();
        // a directory cannot be opened as a file
        let store = ConfigStore::builder().file(dir.path(), "yml").build();

        assert_eq!(store.set("a", json!(1)), None);
        assert_eq!(store.lookup("a"), Some(json!(1)));
        assert!(matches!(store.save(), Err(StoreError::Write { .. })));
    }

    #[test]
    fn test_concurrent_sets_are_not_lost() {
        let store = Arc::new(ConfigStore::default());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        store.set(format!("k{t}_{i}"), json!(i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 400);
        assert_eq!(store.lookup("k7_49"), Some(json!(49)));
    }

    #[test]
    fn test_display_is_json() {
        let store = ConfigStore::new(map(json!({"a": [1, 2]})));
        assert_eq!(store.to_string(), r#"{"a":[1,2]}"#);
    }
}
