//! History-augmented tabular Q-learning.
//!
//! The agent's lookup key for a state is `hash(augment(abstraction(s), history))`.
//! For each observed transition the key of the current state is taken
//! *before* the joint action is recorded, and the next state is augmented
//! *after*, so the just-taken joint action shows up at depth 0 of the next
//! state only.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::action::{ActionIdMap, GroundedAction, JointAction, JointReward};
use crate::agent::{AgentId, World};
use crate::augment::{AugmentedState, HistorySchema, StateAugmenter};
use crate::config::LearningConfig;
use crate::error::{ArgumentError, CollaboratorError, ConfigError, QHistResult};
use crate::hashing::{IdentityAbstraction, StateAbstraction, StateHashStrategy, StateKey};
use crate::history::HistoryBuffer;
use crate::learning::{LearningAgent, MaxQSource, RewardShaper, Transition};
use crate::state::State;
use crate::storage::QValueStore;

/// Builder for [`HistoryQAgent`].
///
/// # Example
/// ```rust,ignore
/// let agent = HistoryQAgent::builder("p0")
///     .config(LearningConfig::new(0.9, 0.1, 2, 2))
///     .world(world)
///     .action_map(Arc::new(NameActionIdMap::new(["cooperate", "defect"])))
///     .hasher(Arc::new(DiscreteHashStrategy::new()))
///     .store(Arc::new(InMemoryQStore::new()))
///     .build()?;
/// ```
#[derive(Default)]
pub struct HistoryQAgentBuilder {
    agent_id: Option<AgentId>,
    config: LearningConfig,
    world: Option<Arc<dyn World>>,
    action_map: Option<Arc<dyn ActionIdMap>>,
    hasher: Option<Arc<dyn StateHashStrategy>>,
    store: Option<Arc<dyn QValueStore>>,
    abstraction: Option<Arc<dyn StateAbstraction>>,
    max_q_source: Option<Arc<dyn MaxQSource>>,
    reward_shaper: Option<Arc<dyn RewardShaper>>,
}

impl HistoryQAgentBuilder {
    /// Creates a builder for the agent named `agent_id`.
    pub fn new(agent_id: impl Into<AgentId>) -> Self {
        Self {
            agent_id: Some(agent_id.into()),
            ..Self::default()
        }
    }

    /// Set the hyperparameters (default: [`LearningConfig::default`]).
    #[must_use]
    pub fn config(mut self, config: LearningConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the world that resolves player slots (required).
    #[must_use]
    pub fn world(mut self, world: Arc<dyn World>) -> Self {
        self.world = Some(world);
        self
    }

    /// Set the action id map (required).
    #[must_use]
    pub fn action_map(mut self, action_map: Arc<dyn ActionIdMap>) -> Self {
        self.action_map = Some(action_map);
        self
    }

    /// Set the state hashing strategy (required).
    #[must_use]
    pub fn hasher(mut self, hasher: Arc<dyn StateHashStrategy>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Set the Q-value store (required).
    #[must_use]
    pub fn store(mut self, store: Arc<dyn QValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the abstraction applied before augmentation (default: identity).
    #[must_use]
    pub fn abstraction(mut self, abstraction: Arc<dyn StateAbstraction>) -> Self {
        self.abstraction = Some(abstraction);
        self
    }

    /// Set an external bootstrap source (default: this agent's own table).
    #[must_use]
    pub fn max_q_source(mut self, source: Arc<dyn MaxQSource>) -> Self {
        self.max_q_source = Some(source);
        self
    }

    /// Set an internal reward function that replaces the joint reward.
    #[must_use]
    pub fn reward_shaper(mut self, shaper: Arc<dyn RewardShaper>) -> Self {
        self.reward_shaper = Some(shaper);
        self
    }

    /// Build the agent.
    ///
    /// Validates the configuration, checks that the world does not hold more
    /// agents than `max_players`, and registers the history record fields
    /// with the hashing strategy when it asks for a schema.
    pub fn build(self) -> QHistResult<HistoryQAgent> {
        let agent_id = self
            .agent_id
            .ok_or(CollaboratorError::Missing { name: "agent_id" })?;
        let world = self.world.ok_or(CollaboratorError::Missing { name: "world" })?;
        let action_map = self
            .action_map
            .ok_or(CollaboratorError::Missing { name: "action_map" })?;
        let hasher = self
            .hasher
            .ok_or(CollaboratorError::Missing { name: "hasher" })?;
        let store = self.store.ok_or(CollaboratorError::Missing { name: "store" })?;

        let config = self.config;
        config.validate()?;

        let registered = world.registered_agents().len();
        if registered > config.max_players {
            return Err(ConfigError::TooManyAgents {
                registered,
                max_players: config.max_players,
            }
            .into());
        }

        let augmenter = StateAugmenter::new(config.history_size, config.max_players, action_map);
        let schema = augmenter.schema();
        if hasher.requires_schema() {
            hasher.register_schema(schema.class(), &schema.field_names())?;
        }

        debug!(
            agent = %agent_id,
            history_size = config.history_size,
            max_players = config.max_players,
            discount = config.discount,
            learning_rate = config.learning_rate,
            "history Q agent built"
        );

        Ok(HistoryQAgent {
            agent_id,
            config,
            history: HistoryBuffer::new(config.history_size),
            augmenter,
            world,
            hasher,
            abstraction: self
                .abstraction
                .unwrap_or_else(|| Arc::new(IdentityAbstraction)),
            store,
            max_q_source: self.max_q_source,
            reward_shaper: self.reward_shaper,
        })
    }
}

/// Tabular Q-learner whose states are augmented with recent joint actions.
///
/// Owns its history buffer; every other collaborator is shared through an
/// `Arc`. Not meant to be driven from several threads at once.
pub struct HistoryQAgent {
    agent_id: AgentId,
    config: LearningConfig,
    history: HistoryBuffer,
    augmenter: StateAugmenter,
    world: Arc<dyn World>,
    hasher: Arc<dyn StateHashStrategy>,
    abstraction: Arc<dyn StateAbstraction>,
    store: Arc<dyn QValueStore>,
    max_q_source: Option<Arc<dyn MaxQSource>>,
    reward_shaper: Option<Arc<dyn RewardShaper>>,
}

impl std::fmt::Debug for HistoryQAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryQAgent")
            .field("agent_id", &self.agent_id)
            .field("config", &self.config)
            .field("history_len", &self.history.len())
            .field("augmenter", &self.augmenter)
            .field("external_max_q", &self.max_q_source.is_some())
            .field("reward_shaper", &self.reward_shaper.is_some())
            .finish_non_exhaustive()
    }
}

impl HistoryQAgent {
    /// Creates a builder for the agent named `agent_id`.
    pub fn builder(agent_id: impl Into<AgentId>) -> HistoryQAgentBuilder {
        HistoryQAgentBuilder::new(agent_id)
    }

    /// The agent this learner updates estimates for.
    #[must_use]
    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Hyperparameters fixed at build time.
    #[must_use]
    pub const fn config(&self) -> &LearningConfig {
        &self.config
    }

    /// The joint actions observed so far this episode, newest first.
    #[must_use]
    pub const fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Shape of the history records attached to states.
    #[must_use]
    pub fn schema(&self) -> HistorySchema {
        self.augmenter.schema()
    }

    /// Clears the history. Must not be called mid-episode.
    pub fn reset(&mut self) {
        self.history.reset();
        debug!(agent = %self.agent_id, "episode starting");
    }

    /// Augments a copy of `state` with the current history.
    pub fn augment(&self, state: &State) -> QHistResult<AugmentedState> {
        self.augmenter
            .augment(state, &self.history, self.world.as_ref())
    }

    /// Lookup key for `state` under the current history.
    pub fn state_key(&self, state: &State) -> QHistResult<StateKey> {
        let abstracted = self.abstraction.abstraction(state);
        let augmented = self.augment(&abstracted)?;
        self.hasher.hash(&augmented)
    }

    /// Current estimate for `action` in `state`, without creating an entry.
    pub fn q_value(&self, state: &State, action: &GroundedAction) -> QHistResult<Option<f64>> {
        let key = self.state_key(state)?;
        Ok(self.store.get(&key, action)?)
    }

    /// Largest estimate over this agent's actions in `state` under the
    /// current history.
    ///
    /// Actions never tried in `state` count at the store's initial value, so
    /// the result is only the stored maximum once every action id has an
    /// entry.
    pub fn max_q_value(&self, state: &State) -> QHistResult<f64> {
        let key = self.state_key(state)?;
        let action_map = self.augmenter.action_map();
        let initial = self.store.initial_q();

        let mut tried = HashSet::new();
        let mut best: Option<f64> = None;
        for entry in self.store.entries_for(&key)? {
            if entry.action.agent != self.agent_id {
                continue;
            }
            if let Ok(id) = action_map.action_id(&entry.action) {
                tried.insert(id);
            }
            best = Some(best.map_or(entry.q, |b| b.max(entry.q)));
        }

        let all_tried = u32::try_from(tried.len()).map_or(true, |n| n >= action_map.max_id());
        Ok(match best {
            Some(best) if all_tried => best,
            Some(best) => best.max(initial),
            None => initial,
        })
    }

    /// Applies one Q-learning update for this agent and returns the new
    /// estimate.
    ///
    /// # Errors
    /// Invalid-argument errors are raised before anything is mutated. If a
    /// later step fails, the history is rolled back and no estimate changes.
    pub fn observe_transition(
        &mut self,
        state: &State,
        joint_action: &JointAction,
        joint_reward: &JointReward,
        next_state: &State,
        is_terminal: bool,
    ) -> QHistResult<f64> {
        let my_action = self.validate(joint_action, joint_reward)?.clone();

        let key = self.state_key(state)?;
        let aug_state = self.augment(state)?;
        let q = self
            .store
            .get(&key, &my_action)?
            .unwrap_or_else(|| self.store.initial_q());

        let evicted = self.history.record(joint_action.clone());

        let step = Step {
            key: &key,
            action: &my_action,
            q,
            aug_state: &aug_state,
            joint_action,
            joint_reward,
            next_state,
            is_terminal,
        };
        match self.apply_update(&step) {
            Ok(updated) => Ok(updated),
            Err(e) => {
                self.history.rollback(evicted);
                Err(e)
            }
        }
    }

    fn apply_update(&self, step: &Step<'_>) -> QHistResult<f64> {
        let aug_next = self.augment(step.next_state)?;

        let reward = match &self.reward_shaper {
            Some(shaper) => shaper
                .reward(step.aug_state, step.joint_action, &aug_next)?
                .get(&self.agent_id),
            None => step.joint_reward.get(&self.agent_id),
        }
        .ok_or_else(|| ArgumentError::MissingReward {
            agent: self.agent_id.clone(),
        })?;

        let max_q = if step.is_terminal {
            0.0
        } else {
            match &self.max_q_source {
                Some(source) => source.max_q(step.next_state)?,
                None => self.max_q_value(step.next_state)?,
            }
        };

        let alpha = self.config.learning_rate;
        let gamma = self.config.discount;
        let updated = step.q + alpha * (reward + gamma * max_q - step.q);
        self.store.put(step.key, step.action, updated)?;

        debug!(
            agent = %self.agent_id,
            state = %step.key,
            action = %step.action,
            reward,
            max_q,
            q_old = step.q,
            q_new = updated,
            terminal = step.is_terminal,
            "Q-learning update"
        );

        Ok(updated)
    }

    /// Rejects transitions the update cannot complete deterministically.
    fn validate<'a>(
        &self,
        joint_action: &'a JointAction,
        joint_reward: &JointReward,
    ) -> QHistResult<&'a GroundedAction> {
        let mine = joint_action
            .action(&self.agent_id)
            .ok_or_else(|| ArgumentError::MissingOwnAction {
                agent: self.agent_id.clone(),
            })?;

        for (agent, action) in joint_action.iter() {
            if action.agent != *agent {
                return Err(ArgumentError::MismatchedActor {
                    action: action.signature(),
                    expected: agent.clone(),
                    actual: action.agent.clone(),
                }
                .into());
            }
            let slot = self.world.player_slot(agent)?;
            if slot >= self.config.max_players {
                return Err(ConfigError::PlayerSlotOutOfRange {
                    agent: agent.clone(),
                    slot,
                    max_players: self.config.max_players,
                }
                .into());
            }
            self.augmenter.action_map().action_id(action)?;
        }

        if self.reward_shaper.is_none() && joint_reward.get(&self.agent_id).is_none() {
            return Err(ArgumentError::MissingReward {
                agent: self.agent_id.clone(),
            }
            .into());
        }

        Ok(mine)
    }
}

/// Inputs to the part of an update that runs after the history moved.
struct Step<'a> {
    key: &'a StateKey,
    action: &'a GroundedAction,
    q: f64,
    aug_state: &'a AugmentedState,
    joint_action: &'a JointAction,
    joint_reward: &'a JointReward,
    next_state: &'a State,
    is_terminal: bool,
}

impl LearningAgent for HistoryQAgent {
    fn on_episode_start(&mut self) {
        self.reset();
    }

    fn on_transition(&mut self, transition: &Transition) -> QHistResult<f64> {
        self.observe_transition(
            &transition.state,
            &transition.joint_action,
            &transition.joint_reward,
            &transition.next_state,
            transition.is_terminal,
        )
    }

    fn compute_state_key(&self, state: &State) -> QHistResult<StateKey> {
        self.state_key(state)
    }
}
