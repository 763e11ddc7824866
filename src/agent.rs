//! Agent identity and the world registry.
//!
//! Agents are identified by name. The world assigns each registered agent a
//! numeric player slot; history records carry the slot, not the name, so
//! that learned values transfer between agents that occupy the same seat.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ArgumentError;

/// Stable agent identifier (the agent's name in the world).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Wraps an agent name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The agent name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for AgentId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Numeric player index of an agent within a world.
pub type PlayerSlot = usize;

/// The world collaborator: which agents are playing, and in which seat.
pub trait World: Send + Sync {
    /// Registered agents, in a stable order.
    fn registered_agents(&self) -> Vec<AgentId>;

    /// Player slot of `agent`.
    ///
    /// # Errors
    /// `ArgumentError::UnknownAgent` if the agent never joined.
    fn player_slot(&self, agent: &AgentId) -> Result<PlayerSlot, ArgumentError>;
}

/// Simple world registry assigning slots in join order.
///
/// # Examples
///
/// ```
/// use qhist::{AgentId, AgentRegistry, World};
///
/// let mut world = AgentRegistry::new();
/// world.join("red");
/// world.join("blue");
/// assert_eq!(world.player_slot(&AgentId::new("blue")).unwrap(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: Vec<AgentId>,
}

impl AgentRegistry {
    /// Registry with no agents.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an agent and returns its slot. Joining twice is a no-op that
    /// returns the original slot.
    pub fn join(&mut self, agent: impl Into<AgentId>) -> PlayerSlot {
        let agent = agent.into();
        if let Some(slot) = self.agents.iter().position(|a| *a == agent) {
            return slot;
        }
        self.agents.push(agent);
        self.agents.len() - 1
    }

    /// Builds a registry from agent names, in order.
    #[must_use]
    pub fn with_agents<I, A>(agents: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<AgentId>,
    {
        let mut registry = Self::new();
        for agent in agents {
            registry.join(agent);
        }
        registry
    }

    /// Number of registered agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// True when nobody joined yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl World for AgentRegistry {
    fn registered_agents(&self) -> Vec<AgentId> {
        self.agents.clone()
    }

    fn player_slot(&self, agent: &AgentId) -> Result<PlayerSlot, ArgumentError> {
        self.agents
            .iter()
            .position(|a| a == agent)
            .ok_or_else(|| ArgumentError::UnknownAgent {
                agent: agent.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_follow_join_order() {
        let world = AgentRegistry::with_agents(["a", "b", "c"]);
        assert_eq!(world.player_slot(&"a".into()).unwrap(), 0);
        assert_eq!(world.player_slot(&"c".into()).unwrap(), 2);
        assert_eq!(world.registered_agents().len(), 3);
    }

    #[test]
    fn test_rejoin_keeps_slot() {
        let mut world = AgentRegistry::new();
        assert_eq!(world.join("a"), 0);
        assert_eq!(world.join("b"), 1);
        assert_eq!(world.join("a"), 0);
        assert_eq!(world.len(), 2);
    }

    #[test]
    fn test_unknown_agent() {
        let world = AgentRegistry::with_agents(["a"]);
        let err = world.player_slot(&"ghost".into()).unwrap_err();
        assert!(matches!(err, ArgumentError::UnknownAgent { .. }));
    }

    #[test]
    fn test_agent_id_serialization() {
        let id = AgentId::new("p0");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"p0\"");
    }
}
