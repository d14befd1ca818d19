//! Nullable store: thread-safe in-memory storage for testing.

use modulr_store::{KeyValueStore, SessionStore, StoreError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// An in-memory key-value store for testing.
///
/// Counts writes and can be told to fail them, for exercising the
/// persist-before-commit paths.
#[derive(Debug, Default)]
pub struct NullStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent `set` fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .lock()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("null store lock poisoned".into())
}

impl KeyValueStore for NullStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.lock().map_err(poisoned)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(format!("write to '{key}' refused")));
        }
        self.entries
            .lock()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().map_err(poisoned)?.remove(key);
        Ok(())
    }
}

impl SessionStore for NullStore {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let store = NullStore::new();
        store.set("a", b"1").unwrap();
        assert_eq!(store.get("a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.write_count(), 1);
        store.remove("a").unwrap();
        assert!(!store.contains("a"));
    }

    #[test]
    fn failing_writes_leave_contents_untouched() {
        let store = NullStore::new();
        store.set("a", b"1").unwrap();
        store.fail_writes(true);
        assert!(store.set("a", b"2").is_err());
        assert_eq!(store.get("a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.write_count(), 1);
    }
}
