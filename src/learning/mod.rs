//! Learning agents and the collaborators they consult.
//!
//! [`LearningAgent`] is the hook surface a simulation loop drives: one call
//! at the start of every episode, one per observed transition.
//! [`HistoryQAgent`] is the history-augmented tabular Q-learner.

mod history_q;

use serde::{Deserialize, Serialize};

use crate::action::{JointAction, JointReward};
use crate::augment::AugmentedState;
use crate::error::QHistResult;
use crate::hashing::StateKey;
use crate::state::State;

pub use history_q::{HistoryQAgent, HistoryQAgentBuilder};

/// One observed step of a stochastic game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// State the joint action was taken in.
    pub state: State,
    /// What every agent did.
    pub joint_action: JointAction,
    /// What every agent received.
    pub joint_reward: JointReward,
    /// State the world moved to.
    pub next_state: State,
    /// Whether `next_state` ends the episode.
    #[serde(default)]
    pub is_terminal: bool,
}

/// Hooks a world calls on each learning agent.
pub trait LearningAgent {
    /// Called once before the first transition of every episode.
    fn on_episode_start(&mut self);

    /// Learns from one transition; returns the updated estimate.
    fn on_transition(&mut self, transition: &Transition) -> QHistResult<f64>;

    /// Lookup key for a raw state as this agent currently sees it.
    fn compute_state_key(&self, state: &State) -> QHistResult<StateKey>;
}

/// Source of the bootstrap value `max_a Q(s', a)`.
///
/// Receives the raw next state; implementations derive whatever augmented
/// key they need.
pub trait MaxQSource: Send + Sync {
    /// Best estimate reachable from `next_state`.
    fn max_q(&self, next_state: &State) -> QHistResult<f64>;
}

impl<F> MaxQSource for F
where
    F: Fn(&State) -> QHistResult<f64> + Send + Sync,
{
    fn max_q(&self, next_state: &State) -> QHistResult<f64> {
        self(next_state)
    }
}

/// Internal reward function computed over augmented states. When an agent
/// has one, the environment's joint reward is ignored.
pub trait RewardShaper: Send + Sync {
    /// Rewards for every agent; only the learner's own entry is read.
    fn reward(
        &self,
        state: &AugmentedState,
        joint_action: &JointAction,
        next_state: &AugmentedState,
    ) -> QHistResult<JointReward>;
}

impl<F> RewardShaper for F
where
    F: Fn(&AugmentedState, &JointAction, &AugmentedState) -> QHistResult<JointReward> + Send + Sync,
{
    fn reward(
        &self,
        state: &AugmentedState,
        joint_action: &JointAction,
        next_state: &AugmentedState,
    ) -> QHistResult<JointReward> {
        self(state, joint_action, next_state)
    }
}
