//! Read-only secondary key sources.
//!
//! The store keeps a fallback behind a `Weak`, so it never extends the
//! host's settings lifetime and never writes through them.

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::sync::{PoisonError, RwLock};

use serde_json::{Map, Value};

/// A key→value source consulted after a primary lookup misses.
pub trait Fallback: Send + Sync {
    fn lookup(&self, key: &str) -> Option<Value>;
}

impl Fallback for Map<String, Value> {
    fn lookup(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

impl<S: BuildHasher + Send + Sync> Fallback for HashMap<String, Value, S> {
    fn lookup(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

impl<T: Fallback> Fallback for RwLock<T> {
    fn lookup(&self, key: &str) -> Option<Value> {
        self.read()
            .unwrap_or_else(PoisonError::into_inner)
            .lookup(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_lookup() {
        let mut settings = Map::new();
        settings.insert("DEBUG".into(), json!(true));

        assert_eq!(settings.lookup("DEBUG"), Some(json!(true)));
        assert_eq!(settings.lookup("missing"), None);
    }

    #[test]
    fn test_locked_lookup_sees_updates() {
        let settings = RwLock::new(HashMap::<String, Value>::new());
        assert_eq!(settings.lookup("port"), None);

        settings.write().unwrap().insert("port".into(), json!(8080));
        assert_eq!(settings.lookup("port"), Some(json!(8080)));
    }
}
