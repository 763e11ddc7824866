//! Actions, joint actions, joint rewards, and action id maps.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::error::ArgumentError;

/// A single-agent action with its parameters bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroundedAction {
    /// The agent taking the action.
    pub agent: AgentId,

    /// Action name (e.g. `"north"`).
    pub name: String,

    /// Bound parameters, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
}

impl GroundedAction {
    /// Creates a parameterless action.
    #[must_use]
    pub fn new(agent: impl Into<AgentId>, name: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Creates an action with parameters.
    #[must_use]
    pub fn with_params<I, P>(agent: impl Into<AgentId>, name: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            agent: agent.into(),
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// `name(p1,p2)` without the acting agent.
    #[must_use]
    pub fn signature(&self) -> String {
        if self.params.is_empty() {
            self.name.clone()
        } else {
            format!("{}({})", self.name, self.params.join(","))
        }
    }
}

impl fmt::Display for GroundedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.agent, self.signature())
    }
}

/// One action per agent for a single time step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JointAction {
    actions: BTreeMap<AgentId, GroundedAction>,
}

impl JointAction {
    /// An empty joint action.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a joint action from single actions, keyed by their acting agent.
    #[must_use]
    pub fn from_actions<I>(actions: I) -> Self
    where
        I: IntoIterator<Item = GroundedAction>,
    {
        let mut joint = Self::new();
        for action in actions {
            joint.add(action);
        }
        joint
    }

    /// Adds `action` under its acting agent, replacing any earlier entry.
    pub fn add(&mut self, action: GroundedAction) {
        self.actions.insert(action.agent.clone(), action);
    }

    /// The action `agent` took, if any.
    #[must_use]
    pub fn action(&self, agent: &AgentId) -> Option<&GroundedAction> {
        self.actions.get(agent)
    }

    /// Iterates (agent, action) pairs in agent order.
    pub fn iter(&self) -> impl Iterator<Item = (&AgentId, &GroundedAction)> {
        self.actions.iter()
    }

    /// Number of acting agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True when no agent acted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Reward received by each agent for one transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JointReward {
    rewards: BTreeMap<AgentId, f64>,
}

impl JointReward {
    /// An empty reward map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reward for `agent`.
    pub fn set(&mut self, agent: impl Into<AgentId>, reward: f64) {
        self.rewards.insert(agent.into(), reward);
    }

    /// Sets a reward (builder style).
    #[must_use]
    pub fn with(mut self, agent: impl Into<AgentId>, reward: f64) -> Self {
        self.set(agent, reward);
        self
    }

    /// Reward for `agent`, if present.
    #[must_use]
    pub fn get(&self, agent: &AgentId) -> Option<f64> {
        self.rewards.get(agent).copied()
    }

    /// Iterates (agent, reward) pairs in agent order.
    pub fn iter(&self) -> impl Iterator<Item = (&AgentId, f64)> {
        self.rewards.iter().map(|(a, r)| (a, *r))
    }
}

/// Bijection from actions to integer ids in `[0, max_id)`.
///
/// `max_id` itself is reserved: history records use it to mean "no action
/// was taken at this depth yet".
pub trait ActionIdMap: Send + Sync {
    /// Id of `action`.
    ///
    /// # Errors
    /// `ArgumentError::UnknownAction` if the action is not in the map.
    fn action_id(&self, action: &GroundedAction) -> Result<u32, ArgumentError>;

    /// The reserved "undefined" id, one greater than the largest real id.
    fn max_id(&self) -> u32;
}

/// Assigns ids by action name only; parameters are ignored.
#[derive(Debug, Clone, Default)]
pub struct NameActionIdMap {
    ids: HashMap<String, u32>,
}

impl NameActionIdMap {
    /// Ids follow the order of `names`; duplicates keep their first id.
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids: HashMap<String, u32> = HashMap::new();
        for name in names {
            let next = u32::try_from(ids.len()).unwrap_or(u32::MAX);
            ids.entry(name.into()).or_insert(next);
        }
        Self { ids }
    }
}

impl ActionIdMap for NameActionIdMap {
    fn action_id(&self, action: &GroundedAction) -> Result<u32, ArgumentError> {
        self.ids
            .get(&action.name)
            .copied()
            .ok_or_else(|| ArgumentError::UnknownAction {
                action: action.signature(),
            })
    }

    fn max_id(&self) -> u32 {
        u32::try_from(self.ids.len()).unwrap_or(u32::MAX)
    }
}

/// Assigns ids to full (name, parameters) signatures.
#[derive(Debug, Clone, Default)]
pub struct ExplicitActionIdMap {
    ids: HashMap<(String, Vec<String>), u32>,
}

impl ExplicitActionIdMap {
    /// An empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a signature and returns its id; re-inserting returns the
    /// existing id.
    pub fn insert<I, P>(&mut self, name: impl Into<String>, params: I) -> u32
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let key = (name.into(), params.into_iter().map(Into::into).collect());
        let next = u32::try_from(self.ids.len()).unwrap_or(u32::MAX);
        *self.ids.entry(key).or_insert(next)
    }
}

impl ActionIdMap for ExplicitActionIdMap {
    fn action_id(&self, action: &GroundedAction) -> Result<u32, ArgumentError> {
        // Borrowed lookup would need a custom key type; signatures are short.
        let key = (action.name.clone(), action.params.clone());
        self.ids
            .get(&key)
            .copied()
            .ok_or_else(|| ArgumentError::UnknownAction {
                action: action.signature(),
            })
    }

    fn max_id(&self) -> u32 {
        u32::try_from(self.ids.len()).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_action_keyed_by_agent() {
        let joint = JointAction::from_actions([
            GroundedAction::new("b", "left"),
            GroundedAction::new("a", "right"),
        ]);
        assert_eq!(joint.len(), 2);
        let agents: Vec<&str> = joint.iter().map(|(a, _)| a.as_str()).collect();
        assert_eq!(agents, vec!["a", "b"]);
        assert_eq!(joint.action(&"b".into()).unwrap().name, "left");
        assert!(joint.action(&"c".into()).is_none());
    }

    #[test]
    fn test_name_map_ignores_params() {
        let map = NameActionIdMap::new(["noop", "move", "noop"]);
        assert_eq!(map.max_id(), 2);
        let a = GroundedAction::with_params("p0", "move", ["north"]);
        let b = GroundedAction::with_params("p1", "move", ["south"]);
        assert_eq!(map.action_id(&a).unwrap(), 1);
        assert_eq!(map.action_id(&b).unwrap(), 1);
        assert_eq!(map.action_id(&GroundedAction::new("p0", "noop")).unwrap(), 0);
    }

    #[test]
    fn test_name_map_unknown_action() {
        let map = NameActionIdMap::new(["noop"]);
        let err = map.action_id(&GroundedAction::new("p0", "jump")).unwrap_err();
        assert!(matches!(err, ArgumentError::UnknownAction { ref action } if action == "jump"));
    }

    #[test]
    fn test_explicit_map_distinguishes_params() {
        let mut map = ExplicitActionIdMap::new();
        assert_eq!(map.insert("move", ["north"]), 0);
        assert_eq!(map.insert("move", ["south"]), 1);
        assert_eq!(map.insert("move", ["north"]), 0);
        assert_eq!(map.max_id(), 2);

        let south = GroundedAction::with_params("p0", "move", ["south"]);
        assert_eq!(map.action_id(&south).unwrap(), 1);
        let east = GroundedAction::with_params("p0", "move", ["east"]);
        assert!(map.action_id(&east).is_err());
    }

    #[test]
    fn test_joint_reward() {
        let r = JointReward::new().with("a", 1.0).with("b", -1.0);
        assert_eq!(r.get(&"a".into()), Some(1.0));
        assert_eq!(r.get(&"c".into()), None);
        assert_eq!(r.iter().count(), 2);
    }

    #[test]
    fn test_display() {
        let a = GroundedAction::with_params("p0", "give", ["coin", "p1"]);
        assert_eq!(a.to_string(), "p0:give(coin,p1)");
    }
}
