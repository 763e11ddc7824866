//! Abstract Q-value storage.
//!
//! The learning engine only needs lookup-or-create, read, write, and a
//! per-state maximum. By using a trait, we enable:
//! - In-memory tables for tests and single-process training
//! - Shared or persistent tables supplied by the caller

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::GroundedAction;
use crate::hashing::StateKey;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Entry was never created.
    #[error("Q entry not found: state={key} action={action}")]
    EntryNotFound {
        /// State key that was looked up.
        key: StateKey,
        /// Display form of the action.
        action: String,
    },

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// A single stored estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QEntry {
    /// State the estimate belongs to.
    pub key: StateKey,
    /// Action the estimate belongs to.
    pub action: GroundedAction,
    /// Current estimate.
    pub q: f64,
}

/// Tabular store of Q-values keyed by (state key, action).
///
/// # Safety Considerations
/// - Methods take `&self`; implementations shared between agents must
///   synchronize internally
/// - `get_or_create` and `put` are the only methods that insert entries
pub trait QValueStore: Send + Sync {
    /// Value for (key, action), inserting `initial_q()` if absent.
    fn get_or_create(&self, key: &StateKey, action: &GroundedAction) -> Result<f64, StorageError>;

    /// Value for (key, action) without inserting.
    fn get(&self, key: &StateKey, action: &GroundedAction) -> Result<Option<f64>, StorageError>;

    /// Overwrites an existing entry.
    ///
    /// # Errors
    /// `EntryNotFound` if the entry was never created.
    fn set(&self, key: &StateKey, action: &GroundedAction, q: f64) -> Result<(), StorageError>;

    /// Inserts or overwrites the entry atomically.
    fn put(&self, key: &StateKey, action: &GroundedAction, q: f64) -> Result<(), StorageError>;

    /// Largest stored value for `key`, or `None` if nothing is stored.
    fn max_q(&self, key: &StateKey) -> Result<Option<f64>, StorageError>;

    /// All entries stored for `key`.
    fn entries_for(&self, key: &StateKey) -> Result<Vec<QEntry>, StorageError>;

    /// Number of stored entries.
    fn len(&self) -> Result<usize, StorageError>;

    /// Value new entries start at.
    fn initial_q(&self) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure the trait is object-safe
    fn _assert_q_store_object_safe(_: &dyn QValueStore) {}

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::EntryNotFound {
            key: StateKey::from_bytes([0; 32]),
            action: "p0:go".to_string(),
        };
        assert!(err.to_string().contains("p0:go"));

        let err = StorageError::BackendError("poisoned lock".to_string());
        assert!(err.to_string().contains("poisoned lock"));
    }
}
