//! State hashing for tabular lookups.
//!
//! A [`StateHashStrategy`] maps an augmented state to a [`StateKey`]. Two
//! augmented states with the same raw content and the same history records
//! must map to the same key. Raw states are hashed as augmented states with
//! no records.

mod digest;
mod discrete;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::augment::AugmentedState;
use crate::error::QHistResult;
use crate::state::State;

pub use digest::DigestHashStrategy;
pub use discrete::DiscreteHashStrategy;

/// Opaque lookup key produced by a hashing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateKey([u8; 32]);

impl StateKey {
    /// Wraps a raw digest.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw digest.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<blake3::Hash> for StateKey {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", blake3::Hash::from(self.0).to_hex())
    }
}

/// Maps augmented states to lookup keys.
pub trait StateHashStrategy: Send + Sync {
    /// Key for `state`.
    fn hash(&self, state: &AugmentedState) -> QHistResult<StateKey>;

    /// Whether the strategy only hashes attributes it has been told about.
    fn requires_schema(&self) -> bool {
        false
    }

    /// Declares which attributes of `class` participate in hashing.
    fn register_schema(&self, _class: &str, _fields: &[&str]) -> QHistResult<()> {
        Ok(())
    }
}

/// Projection applied to a raw state before it is augmented and hashed.
pub trait StateAbstraction: Send + Sync {
    fn abstraction(&self, state: &State) -> State;
}

/// Leaves states untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityAbstraction;

impl StateAbstraction for IdentityAbstraction {
    fn abstraction(&self, state: &State) -> State {
        state.clone()
    }
}

/// Drops every object belonging to one of the listed classes.
#[derive(Debug, Clone, Default)]
pub struct DropClassesAbstraction {
    classes: BTreeSet<String>,
}

impl DropClassesAbstraction {
    /// Drops every object whose class is in `classes`.
    #[must_use]
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }
}

impl StateAbstraction for DropClassesAbstraction {
    fn abstraction(&self, state: &State) -> State {
        let mut out = State::new();
        for (name, object) in state.objects() {
            if !self.classes.contains(&object.class) {
                out.add_object(name, object.clone());
            }
        }
        out
    }
}

/// Length-prefixed string, so adjacent fields cannot run together.
pub(crate) fn put_str(hasher: &mut blake3::Hasher, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}
