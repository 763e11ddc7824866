//! Exact-match hashing over declared attributes.

use std::collections::HashMap;
use std::sync::RwLock;

use blake3::Hasher;

use crate::augment::{AugmentedState, ATT_ACTION, ATT_DEPTH, ATT_PLAYER, HISTORY_CLASS};
use crate::error::QHistResult;
use crate::hashing::{put_str, StateHashStrategy, StateKey};
use crate::storage::StorageError;

const DOMAIN: &[u8] = b"qhist.state.discrete.v1";

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

/// Hashes each object by its class and the attributes registered for that
/// class, ignoring object names.
///
/// Classes with nothing registered hash all of their attributes. Object
/// digests are sorted before being combined, so two states holding the same
/// objects under different names produce the same key.
#[derive(Debug, Default)]
pub struct DiscreteHashStrategy {
    attributes: RwLock<HashMap<String, Vec<String>>>,
}

impl DiscreteHashStrategy {
    /// Strategy with no registered attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes registered for `class`, if any.
    pub fn attributes_for(&self, class: &str) -> QHistResult<Option<Vec<String>>> {
        let guard = self
            .attributes
            .read()
            .map_err(|_| lock_err("discrete.attributes_for"))?;
        Ok(guard.get(class).cloned())
    }
}

impl StateHashStrategy for DiscreteHashStrategy {
    fn hash(&self, state: &AugmentedState) -> QHistResult<StateKey> {
        let attributes = self
            .attributes
            .read()
            .map_err(|_| lock_err("discrete.hash"))?;

        let mut digests: Vec<[u8; 32]> =
            Vec::with_capacity(state.state().len() + state.record_count());

        for (_, object) in state.state().objects() {
            let mut h = Hasher::new();
            put_str(&mut h, &object.class);
            if let Some(fields) = attributes.get(&object.class) {
                for field in fields {
                    put_str(&mut h, field);
                    match object.get(field) {
                        Some(value) => {
                            h.update(&[1]);
                            value.hash_into(&mut h);
                        }
                        None => {
                            h.update(&[0]);
                        }
                    }
                }
            } else {
                for (attribute, value) in &object.values {
                    put_str(&mut h, attribute);
                    value.hash_into(&mut h);
                }
            }
            digests.push(*h.finalize().as_bytes());
        }

        let default_fields = [ATT_DEPTH, ATT_PLAYER, ATT_ACTION].map(String::from);
        let record_fields = attributes
            .get(HISTORY_CLASS)
            .map_or(&default_fields[..], Vec::as_slice);

        for (_, record) in state.records() {
            let mut h = Hasher::new();
            put_str(&mut h, HISTORY_CLASS);
            for field in record_fields {
                put_str(&mut h, field);
                match record.field(field) {
                    Some(v) => {
                        h.update(&[1]);
                        h.update(&v.to_le_bytes());
                    }
                    None => {
                        h.update(&[0]);
                    }
                }
            }
            digests.push(*h.finalize().as_bytes());
        }

        digests.sort_unstable();

        let mut h = Hasher::new();
        h.update(DOMAIN);
        h.update(&(digests.len() as u64).to_le_bytes());
        for d in &digests {
            h.update(d);
        }
        Ok(h.finalize().into())
    }

    fn requires_schema(&self) -> bool {
        true
    }

    fn register_schema(&self, class: &str, fields: &[&str]) -> QHistResult<()> {
        let mut guard = self
            .attributes
            .write()
            .map_err(|_| lock_err("discrete.register_schema"))?;
        guard.insert(
            class.to_string(),
            fields.iter().map(|f| (*f).to_string()).collect(),
        );
        Ok(())
    }
}
