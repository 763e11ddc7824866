//! In-memory Q-value storage backend.
//!
//! Thread-safe, intended for single-process training, tests, and as a
//! reference implementation of [`QValueStore`].

use std::collections::HashMap;
use std::sync::RwLock;

use crate::action::GroundedAction;
use crate::hashing::StateKey;
use crate::storage::traits::{QEntry, QValueStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

type ActionValues = HashMap<GroundedAction, f64>;

/// Thread-safe in-memory Q table.
#[derive(Debug, Default)]
pub struct InMemoryQStore {
    table: RwLock<HashMap<StateKey, ActionValues>>,
    initial_q: f64,
}

impl InMemoryQStore {
    /// Create a new empty store whose entries start at 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty store whose entries start at `initial_q`.
    #[must_use]
    pub fn with_initial_q(initial_q: f64) -> Self {
        Self {
            table: RwLock::default(),
            initial_q,
        }
    }

    /// Number of distinct state keys with at least one entry.
    pub fn state_count(&self) -> Result<usize, StorageError> {
        let table = self.table.read().map_err(|_| lock_err("q.state_count"))?;
        Ok(table.len())
    }
}

impl QValueStore for InMemoryQStore {
    fn get_or_create(&self, key: &StateKey, action: &GroundedAction) -> Result<f64, StorageError> {
        {
            let table = self.table.read().map_err(|_| lock_err("q.get_or_create"))?;
            if let Some(q) = table.get(key).and_then(|values| values.get(action)) {
                return Ok(*q);
            }
        }

        let mut table = self.table.write().map_err(|_| lock_err("q.get_or_create"))?;
        // Another thread may have inserted it between the two locks.
        let q = *table
            .entry(*key)
            .or_default()
            .entry(action.clone())
            .or_insert(self.initial_q);
        Ok(q)
    }

    fn get(&self, key: &StateKey, action: &GroundedAction) -> Result<Option<f64>, StorageError> {
        let table = self.table.read().map_err(|_| lock_err("q.get"))?;
        Ok(table.get(key).and_then(|values| values.get(action)).copied())
    }

    fn set(&self, key: &StateKey, action: &GroundedAction, q: f64) -> Result<(), StorageError> {
        let mut table = self.table.write().map_err(|_| lock_err("q.set"))?;
        let slot = table
            .get_mut(key)
            .and_then(|values| values.get_mut(action))
            .ok_or_else(|| StorageError::EntryNotFound {
                key: *key,
                action: action.to_string(),
            })?;
        *slot = q;
        Ok(())
    }

    fn put(&self, key: &StateKey, action: &GroundedAction, q: f64) -> Result<(), StorageError> {
        let mut table = self.table.write().map_err(|_| lock_err("q.put"))?;
        table.entry(*key).or_default().insert(action.clone(), q);
        Ok(())
    }

    fn max_q(&self, key: &StateKey) -> Result<Option<f64>, StorageError> {
        let table = self.table.read().map_err(|_| lock_err("q.max_q"))?;
        Ok(table
            .get(key)
            .and_then(|values| values.values().copied().reduce(f64::max)))
    }

    fn entries_for(&self, key: &StateKey) -> Result<Vec<QEntry>, StorageError> {
        let table = self.table.read().map_err(|_| lock_err("q.entries_for"))?;
        let mut out: Vec<QEntry> = table
            .get(key)
            .map(|values| {
                values
                    .iter()
                    .map(|(action, q)| QEntry {
                        key: *key,
                        action: action.clone(),
                        q: *q,
                    })
                    .collect()
            })
            .unwrap_or_default();
        out.sort_by(|a, b| a.action.cmp(&b.action));
        Ok(out)
    }

    fn len(&self) -> Result<usize, StorageError> {
        let table = self.table.read().map_err(|_| lock_err("q.len"))?;
        Ok(table.values().map(HashMap::len).sum())
    }

    fn initial_q(&self) -> f64 {
        self.initial_q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(tag: &[u8]) -> StateKey {
        StateKey::from(blake3::hash(tag))
    }

    #[test]
    fn test_get_or_create_inserts_initial_value() {
        let store = InMemoryQStore::with_initial_q(0.5);
        let a = GroundedAction::new("p0", "go");
        assert_eq!(store.get(&key(b"s"), &a).unwrap(), None);
        assert!((store.get_or_create(&key(b"s"), &a).unwrap() - 0.5).abs() < f64::EPSILON);
        assert_eq!(store.get(&key(b"s"), &a).unwrap(), Some(0.5));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_set_requires_existing_entry() {
        let store = InMemoryQStore::new();
        let a = GroundedAction::new("p0", "go");
        let err = store.set(&key(b"s"), &a, 1.0).unwrap_err();
        assert!(matches!(err, StorageError::EntryNotFound { .. }));
        assert_eq!(store.len().unwrap(), 0);

        store.get_or_create(&key(b"s"), &a).unwrap();
        store.set(&key(b"s"), &a, 1.0).unwrap();
        assert_eq!(store.get(&key(b"s"), &a).unwrap(), Some(1.0));
        // Re-fetching does not reset the value.
        assert_eq!(store.get_or_create(&key(b"s"), &a).unwrap(), 1.0);
    }

    #[test]
    fn test_put_inserts_or_overwrites() {
        let store = InMemoryQStore::with_initial_q(0.5);
        let a = GroundedAction::new("p0", "go");
        store.put(&key(b"s"), &a, -1.0).unwrap();
        assert_eq!(store.get(&key(b"s"), &a).unwrap(), Some(-1.0));
        store.put(&key(b"s"), &a, 2.0).unwrap();
        assert_eq!(store.get(&key(b"s"), &a).unwrap(), Some(2.0));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_max_q() {
        let store = InMemoryQStore::new();
        assert_eq!(store.max_q(&key(b"s")).unwrap(), None);

        let go = GroundedAction::new("p0", "go");
        let stay = GroundedAction::new("p0", "stay");
        store.get_or_create(&key(b"s"), &go).unwrap();
        store.get_or_create(&key(b"s"), &stay).unwrap();
        store.set(&key(b"s"), &go, -2.0).unwrap();
        store.set(&key(b"s"), &stay, 3.0).unwrap();

        assert_eq!(store.max_q(&key(b"s")).unwrap(), Some(3.0));
        assert_eq!(store.max_q(&key(b"t")).unwrap(), None);
    }

    #[test]
    fn test_entries_for_is_sorted() {
        let store = InMemoryQStore::new();
        let k = key(b"s");
        for name in ["z", "a", "m"] {
            store.get_or_create(&k, &GroundedAction::new("p0", name)).unwrap();
        }
        let names: Vec<String> = store
            .entries_for(&k)
            .unwrap()
            .into_iter()
            .map(|e| e.action.name)
            .collect();
        assert_eq!(names, vec!["a", "m", "z"]);
        assert_eq!(store.state_count().unwrap(), 1);
    }
}
