//! Recursive merge of one mapping into another, reporting every leaf change.
//!
//! Only mappings are merged key by key. Everything else (scalars, sequences,
//! a mapping meeting a non-mapping) is replaced wholesale and recorded as one
//! change at its dot-joined path.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// Separator used when flattening key paths.
pub const PATH_SEPARATOR: &str = ".";

/// One leaf replacement or addition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    pub new: Value,
    /// `None` when the key did not exist before the merge.
    pub old: Option<Value>,
}

impl Change {
    pub fn is_addition(&self) -> bool {
        self.old.is_none()
    }
}

/// Changes keyed by flattened path, e.g. `"b.d"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet(BTreeMap<String, Change>);

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&Change> {
        self.0.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Change)> {
        self.0.iter().map(|(path, change)| (path.as_str(), change))
    }

    fn record(&mut self, path: &[&str], new: Value, old: Option<Value>) {
        self.0.insert(path.join(PATH_SEPARATOR), Change { new, old });
    }
}

impl IntoIterator for ChangeSet {
    type Item = (String, Change);
    type IntoIter = std::collections::btree_map::IntoIter<String, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Merge `incoming` into `target`, last write wins at the leaves.
///
/// `incoming` is left untouched.
pub fn merge_maps(target: &mut Map<String, Value>, incoming: &Map<String, Value>) -> ChangeSet {
    let mut changes = ChangeSet::new();
    merge_at(target, incoming, &[], &mut changes);
    changes
}

fn merge_at(
    target: &mut Map<String, Value>,
    incoming: &Map<String, Value>,
    path: &[&str],
    changes: &mut ChangeSet,
) {
    for (key, value) in incoming {
        // Each branch owns its own path so siblings never see each other's segments.
        let mut branch = path.to_vec();
        branch.push(key.as_str());

        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                merge_at(existing, nested, &branch, changes);
            }
            _ => {
                let old = target.insert(key.clone(), value.clone());
                changes.record(&branch, value.clone(), old);
            }
        }
    }
}
