//! History augmentation of raw states.
//!
//! An augmented state is a copy of the raw state plus one [`HistoryRecord`]
//! per (registered agent, lookback depth). Depths with no real history yet
//! carry the action map's reserved undefined id, so the number of records is
//! always `agents × history_size` no matter how far into the episode we are.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::action::ActionIdMap;
use crate::agent::{AgentId, PlayerSlot, World};
use crate::error::{ConfigError, QHistResult};
use crate::history::HistoryBuffer;
use crate::state::State;

/// Class name of the synthetic history record type.
pub const HISTORY_CLASS: &str = "histAID";

/// How many steps back the recorded action was taken (0 = most recent).
pub const ATT_DEPTH: &str = "histNum";

/// Player slot of the agent that took the action.
pub const ATT_PLAYER: &str = "histPN";

/// Id of the action taken.
pub const ATT_ACTION: &str = "histAID";

/// One synthetic fact: which action the agent in `agent_slot` took `depth`
/// steps ago.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Steps back in time; 0 is the most recent joint action.
    pub depth: usize,
    /// Player slot of the agent the record describes.
    pub agent_slot: PlayerSlot,
    /// Action id, or the undefined id when nothing is known.
    pub action_id: u32,
}

impl HistoryRecord {
    /// Value of a schema field by attribute name.
    #[must_use]
    pub fn field(&self, attribute: &str) -> Option<i64> {
        match attribute {
            ATT_DEPTH => i64::try_from(self.depth).ok(),
            ATT_PLAYER => i64::try_from(self.agent_slot).ok(),
            ATT_ACTION => Some(i64::from(self.action_id)),
            _ => None,
        }
    }
}

/// A discrete field of the history record type with its inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaField {
    /// Attribute name.
    pub name: &'static str,
    /// Smallest legal value.
    pub min: i64,
    /// Largest legal value.
    pub max: i64,
}

/// Declared shape of the history record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistorySchema {
    history_size: usize,
    max_players: usize,
    max_action_id: u32,
}

impl HistorySchema {
    /// Schema for the given history depth, player count and undefined action id.
    #[must_use]
    pub const fn new(history_size: usize, max_players: usize, max_action_id: u32) -> Self {
        Self {
            history_size,
            max_players,
            max_action_id,
        }
    }

    /// Class name the fields belong to.
    #[must_use]
    pub const fn class(&self) -> &'static str {
        HISTORY_CLASS
    }

    /// The three fields participating in hashing and equality. The action
    /// range includes the undefined sentinel.
    #[must_use]
    pub fn fields(&self) -> [SchemaField; 3] {
        let as_max = |n: usize| i64::try_from(n).unwrap_or(i64::MAX) - 1;
        [
            SchemaField {
                name: ATT_DEPTH,
                min: 0,
                max: as_max(self.history_size),
            },
            SchemaField {
                name: ATT_PLAYER,
                min: 0,
                max: as_max(self.max_players),
            },
            SchemaField {
                name: ATT_ACTION,
                min: 0,
                max: i64::from(self.max_action_id),
            },
        ]
    }

    /// Field names, in declaration order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields().iter().map(|f| f.name).collect()
    }

    /// Number of player slots.
    #[must_use]
    pub const fn max_players(&self) -> usize {
        self.max_players
    }
}

/// Raw state plus synthesized history records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AugmentedState {
    state: State,
    records: BTreeMap<String, HistoryRecord>,
}

impl AugmentedState {
    /// Wraps a raw state without any history records.
    #[must_use]
    pub fn from_raw(state: State) -> Self {
        Self {
            state,
            records: BTreeMap::new(),
        }
    }

    /// Unique record name for an (agent, depth) pair.
    #[must_use]
    pub fn record_name(agent: &AgentId, depth: usize) -> String {
        format!("{agent}-h{depth}")
    }

    /// The copied raw state.
    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Records keyed by their synthetic name, in name order.
    pub fn records(&self) -> impl Iterator<Item = (&str, &HistoryRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Record for `agent` at `depth`.
    #[must_use]
    pub fn record(&self, agent: &AgentId, depth: usize) -> Option<&HistoryRecord> {
        self.records.get(&Self::record_name(agent, depth))
    }

    /// Number of attached history records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    fn attach(&mut self, agent: &AgentId, record: HistoryRecord) {
        self.records
            .insert(Self::record_name(agent, record.depth), record);
    }

    fn has(&self, agent: &AgentId, depth: usize) -> bool {
        self.records.contains_key(&Self::record_name(agent, depth))
    }
}

/// Builds augmented states from a raw state and the joint-action history.
#[derive(Clone)]
pub struct StateAugmenter {
    history_size: usize,
    max_players: usize,
    action_map: Arc<dyn ActionIdMap>,
}

impl std::fmt::Debug for StateAugmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateAugmenter")
            .field("history_size", &self.history_size)
            .field("max_players", &self.max_players)
            .field("max_action_id", &self.action_map.max_id())
            .finish()
    }
}

impl StateAugmenter {
    /// Augmenter attaching `history_size` steps for up to `max_players` agents.
    #[must_use]
    pub fn new(history_size: usize, max_players: usize, action_map: Arc<dyn ActionIdMap>) -> Self {
        Self {
            history_size,
            max_players,
            action_map,
        }
    }

    /// Schema of the records this augmenter produces.
    #[must_use]
    pub fn schema(&self) -> HistorySchema {
        HistorySchema::new(self.history_size, self.max_players, self.action_map.max_id())
    }

    /// Depth of history attached to each state.
    #[must_use]
    pub const fn history_size(&self) -> usize {
        self.history_size
    }

    /// Map used to turn actions into record ids.
    #[must_use]
    pub fn action_map(&self) -> &dyn ActionIdMap {
        self.action_map.as_ref()
    }

    /// Augments a copy of `state` with the actions recorded in `history`.
    ///
    /// Registered agents with no entry at some depth (because the episode is
    /// younger than `history_size` steps, or the joint action was partial)
    /// get a record with the undefined action id.
    ///
    /// # Errors
    /// - `ArgumentError::UnknownAgent` if the history names an unregistered agent
    /// - `ArgumentError::UnknownAction` if a recorded action has no id
    /// - `ConfigError::PlayerSlotOutOfRange` if a slot exceeds `max_players`
    pub fn augment(
        &self,
        state: &State,
        history: &HistoryBuffer,
        world: &dyn World,
    ) -> QHistResult<AugmentedState> {
        let mut augmented = AugmentedState::from_raw(state.clone());
        if self.history_size == 0 {
            return Ok(augmented);
        }

        let registered = world.registered_agents();
        let undefined = self.action_map.max_id();

        for depth in 0..self.history_size {
            if let Some(joint) = history.get(depth) {
                for (agent, action) in joint.iter() {
                    let record = HistoryRecord {
                        depth,
                        agent_slot: self.slot(world, agent)?,
                        action_id: self.action_map.action_id(action)?,
                    };
                    augmented.attach(agent, record);
                }
            }

            for agent in &registered {
                if augmented.has(agent, depth) {
                    continue;
                }
                let record = HistoryRecord {
                    depth,
                    agent_slot: self.slot(world, agent)?,
                    action_id: undefined,
                };
                augmented.attach(agent, record);
            }
        }

        Ok(augmented)
    }

    fn slot(&self, world: &dyn World, agent: &AgentId) -> QHistResult<PlayerSlot> {
        let slot = world.player_slot(agent)?;
        if slot >= self.max_players {
            return Err(ConfigError::PlayerSlotOutOfRange {
                agent: agent.clone(),
                slot,
                max_players: self.max_players,
            }
            .into());
        }
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{GroundedAction, JointAction, NameActionIdMap};
    use crate::agent::AgentRegistry;
    use crate::state::ObjectInstance;

    fn setup(history_size: usize) -> (StateAugmenter, AgentRegistry) {
        let map = Arc::new(NameActionIdMap::new(["stay", "go"]));
        let world = AgentRegistry::with_agents(["a", "b"]);
        (StateAugmenter::new(history_size, 2, map), world)
    }

    fn joint(a: &str, b: &str) -> JointAction {
        JointAction::from_actions([GroundedAction::new("a", a), GroundedAction::new("b", b)])
    }

    fn raw() -> State {
        State::new().with_object("cell", ObjectInstance::new("cell").with("x", 1))
    }

    #[test]
    fn test_empty_history_is_all_undefined() {
        let (aug, world) = setup(3);
        let out = aug.augment(&raw(), &HistoryBuffer::new(3), &world).unwrap();
        assert_eq!(out.record_count(), 6);
        assert!(out.records().all(|(_, r)| r.action_id == 2));
        assert_eq!(out.state(), &raw());
    }

    #[test]
    fn test_records_follow_history_depth() {
        let (aug, world) = setup(2);
        let mut history = HistoryBuffer::new(2);
        history.record(joint("stay", "stay"));
        history.record(joint("go", "stay"));

        let out = aug.augment(&raw(), &history, &world).unwrap();
        let a0 = out.record(&"a".into(), 0).unwrap();
        assert_eq!((a0.depth, a0.agent_slot, a0.action_id), (0, 0, 1));
        let a1 = out.record(&"a".into(), 1).unwrap();
        assert_eq!(a1.action_id, 0);
        let b0 = out.record(&"b".into(), 0).unwrap();
        assert_eq!((b0.agent_slot, b0.action_id), (1, 0));
    }

    #[test]
    fn test_partial_joint_action_fills_undefined() {
        let (aug, world) = setup(1);
        let mut history = HistoryBuffer::new(1);
        history.record(JointAction::from_actions([GroundedAction::new("a", "go")]));

        let out = aug.augment(&raw(), &history, &world).unwrap();
        assert_eq!(out.record_count(), 2);
        assert_eq!(out.record(&"a".into(), 0).unwrap().action_id, 1);
        assert_eq!(out.record(&"b".into(), 0).unwrap().action_id, 2);
    }

    #[test]
    fn test_zero_history_is_identity() {
        let (aug, world) = setup(0);
        let mut history = HistoryBuffer::new(0);
        history.record(joint("go", "go"));
        let out = aug.augment(&raw(), &history, &world).unwrap();
        assert_eq!(out.record_count(), 0);
        assert_eq!(out, AugmentedState::from_raw(raw()));
    }

    #[test]
    fn test_unknown_action_fails() {
        let (aug, world) = setup(1);
        let mut history = HistoryBuffer::new(1);
        history.record(joint("fly", "go"));
        let err = aug.augment(&raw(), &history, &world).unwrap_err();
        assert!(err.is_argument());
    }

    #[test]
    fn test_slot_beyond_max_players_fails() {
        let map = Arc::new(NameActionIdMap::new(["go"]));
        let aug = StateAugmenter::new(1, 1, map);
        let world = AgentRegistry::with_agents(["a", "b"]);
        let err = aug.augment(&raw(), &HistoryBuffer::new(1), &world).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_schema_ranges() {
        let (aug, _) = setup(3);
        let fields = aug.schema().fields();
        assert_eq!(fields[0].name, ATT_DEPTH);
        assert_eq!((fields[0].min, fields[0].max), (0, 2));
        assert_eq!((fields[1].min, fields[1].max), (0, 1));
        assert_eq!((fields[2].min, fields[2].max), (0, 2));
    }

    #[test]
    fn test_record_field_lookup() {
        let r = HistoryRecord {
            depth: 1,
            agent_slot: 3,
            action_id: 7,
        };
        assert_eq!(r.field(ATT_DEPTH), Some(1));
        assert_eq!(r.field(ATT_PLAYER), Some(3));
        assert_eq!(r.field(ATT_ACTION), Some(7));
        assert_eq!(r.field("other"), None);
    }
}
