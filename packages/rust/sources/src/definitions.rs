//! First-writer-wins definition table shared by the definition adapters.

use std::collections::HashMap;

/// Lookup key → definition. Once a key has a definition it is never replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionMap {
    entries: HashMap<String, String>,
}

impl DefinitionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `definition` under `key` unless the key is already taken or
    /// either side is empty. Returns `true` when the value was stored.
    pub fn insert_first(&mut self, key: impl Into<String>, definition: impl Into<String>) -> bool {
        let key = key.into();
        let definition = definition.into();
        if key.is_empty() || definition.is_empty() || self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, definition);
        true
    }

    /// Merge `other` into `self`; keys already present in `self` keep their value.
    pub fn merge(&mut self, other: DefinitionMap) -> usize {
        let mut added = 0;
        for (key, definition) in other.entries {
            if self.insert_first(key, definition) {
                added += 1;
            }
        }
        added
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DefinitionMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert_first(k, v);
        }
        map
    }
}
