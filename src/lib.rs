//! # qhist - History-augmented tabular Q-learning
//!
//! qhist implements a model-free Q-learning update for multi-agent stochastic
//! games in which an agent's view of the state is extended with the joint
//! actions taken over the last few steps. The Markov state representation is
//! left untouched; the history rides along as synthetic records that the
//! tabular lookup hashes together with the raw state.
//!
//! ## Core Concepts
//!
//! - **HistoryBuffer**: Bounded, most-recent-first record of joint actions
//! - **StateAugmenter**: Attaches one history record per (agent, depth) to a state copy
//! - **StateHashStrategy**: Maps augmented states to tabular lookup keys
//! - **HistoryQAgent**: Applies the one-step Q-learning update per transition
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use qhist::{
//!     AgentRegistry, DiscreteHashStrategy, HistoryQAgent, InMemoryQStore,
//!     LearningConfig, NameActionIdMap,
//! };
//!
//! let world = Arc::new(AgentRegistry::with_agents(["row", "col"]));
//! let mut agent = HistoryQAgent::builder("row")
//!     .config(LearningConfig::new(0.95, 0.1, 2, 2))
//!     .world(world)
//!     .action_map(Arc::new(NameActionIdMap::new(["cooperate", "defect"])))
//!     .hasher(Arc::new(DiscreteHashStrategy::new()))
//!     .store(Arc::new(InMemoryQStore::new()))
//!     .build()?;
//!
//! agent.reset();
//! let q = agent.observe_transition(&s, &joint, &rewards, &s_next, false)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod agent;
pub mod augment;
pub mod config;
pub mod error;
pub mod hashing;
pub mod history;
pub mod learning;
pub mod state;
pub mod storage;
pub mod value;

// Re-export primary types at crate root for convenience
pub use action::{
    ActionIdMap, ExplicitActionIdMap, GroundedAction, JointAction, JointReward, NameActionIdMap,
};
pub use agent::{AgentId, AgentRegistry, PlayerSlot, World};
pub use augment::{AugmentedState, HistoryRecord, HistorySchema, SchemaField, StateAugmenter};
pub use config::LearningConfig;
pub use error::{
    ArgumentError, CollaboratorError, ConfigError, QHistError, QHistResult,
};
pub use hashing::{
    DigestHashStrategy, DiscreteHashStrategy, DropClassesAbstraction, IdentityAbstraction,
    StateAbstraction, StateHashStrategy, StateKey,
};
pub use history::HistoryBuffer;
pub use learning::{
    HistoryQAgent, HistoryQAgentBuilder, LearningAgent, MaxQSource, RewardShaper, Transition,
};
pub use state::{ObjectInstance, State};
pub use storage::{InMemoryQStore, QEntry, QValueStore, StorageError};
pub use value::Value;
