//! Q-value storage.
//!
//! The trait defines the contract the learning engine relies on; the
//! in-memory backend is the reference implementation.

mod memory;
mod traits;

pub use memory::InMemoryQStore;
pub use traits::{QEntry, QValueStore, StorageError};
