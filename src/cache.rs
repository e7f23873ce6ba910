//! Session-scoped memoization.
//!
//! A plain map from key (usually a URL) to a cloned result. Entries live as long
//! as the cache; there is no eviction because a session only touches a few
//! hundred pages.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct SessionCache<V> {
    entries: Mutex<HashMap<String, V>>,
}

impl<V: Clone> SessionCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.lock().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.lock().insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    // Entries are inserted whole; a poisoned lock still holds a consistent map.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, V>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
