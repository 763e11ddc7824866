//! Full-content blake3 hashing.

use blake3::Hasher;

use crate::augment::AugmentedState;
use crate::error::QHistResult;
use crate::hashing::{put_str, StateHashStrategy, StateKey};

const DOMAIN: &[u8] = b"qhist.state.digest.v1";

/// Hashes every object (by name), every attribute, and every history record.
///
/// Needs no schema: all content participates. Object and record names are
/// part of the key, so two states that differ only in naming hash apart.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestHashStrategy;

impl DigestHashStrategy {
    /// Creates the strategy.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl StateHashStrategy for DigestHashStrategy {
    fn hash(&self, state: &AugmentedState) -> QHistResult<StateKey> {
        let mut h = Hasher::new();
        h.update(DOMAIN);

        h.update(&(state.state().len() as u64).to_le_bytes());
        for (name, object) in state.state().objects() {
            put_str(&mut h, name);
            put_str(&mut h, &object.class);
            h.update(&(object.values.len() as u64).to_le_bytes());
            for (attribute, value) in &object.values {
                put_str(&mut h, attribute);
                value.hash_into(&mut h);
            }
        }

        h.update(&(state.record_count() as u64).to_le_bytes());
        for (name, record) in state.records() {
            put_str(&mut h, name);
            h.update(&(record.depth as u64).to_le_bytes());
            h.update(&(record.agent_slot as u64).to_le_bytes());
            h.update(&record.action_id.to_le_bytes());
        }

        Ok(h.finalize().into())
    }
}
