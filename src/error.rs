//! Error types for qhist.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! the failure class. None of them are transient: every variant signals a
//! programming or integration defect and is surfaced instead of retried.

use thiserror::Error;

use crate::agent::AgentId;
use crate::storage::StorageError;

/// Invalid-configuration errors, detected while building an agent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Discount factor {value} is out of range [0.0, 1.0]")]
    DiscountOutOfRange {
        value: f64,
    },

    #[error("Learning rate {value} is out of range (0.0, 1.0]")]
    LearningRateOutOfRange {
        value: f64,
    },

    #[error("max_players must be at least 1")]
    NoPlayers,

    #[error("{registered} agents are registered but max_players is {max_players}")]
    TooManyAgents {
        registered: usize,
        max_players: usize,
    },

    #[error("Player slot {slot} for agent '{agent}' is outside [0, {max_players})")]
    PlayerSlotOutOfRange {
        agent: AgentId,
        slot: usize,
        max_players: usize,
    },

    #[error("Malformed configuration: {message}")]
    Malformed {
        message: String,
    },
}

/// Invalid-argument errors raised by a malformed transition.
#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("Joint action has no entry for agent '{agent}'")]
    MissingOwnAction {
        agent: AgentId,
    },

    #[error("Agent '{agent}' is not registered with the world")]
    UnknownAgent {
        agent: AgentId,
    },

    #[error("Action '{action}' is not known to the action id map")]
    UnknownAction {
        action: String,
    },

    #[error("Joint reward has no entry for agent '{agent}'")]
    MissingReward {
        agent: AgentId,
    },

    #[error("Action '{action}' was taken by '{actual}' but recorded under '{expected}'")]
    MismatchedActor {
        action: String,
        expected: AgentId,
        actual: AgentId,
    },
}

/// A required collaborator was never supplied.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Required collaborator '{name}' is missing")]
    Missing {
        name: &'static str,
    },
}

/// Top-level error type for qhist.
#[derive(Debug, Error)]
pub enum QHistError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid argument: {0}")]
    Argument(#[from] ArgumentError),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl QHistError {
    /// Returns true if this is an invalid-configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this is an invalid-argument error.
    #[must_use]
    pub const fn is_argument(&self) -> bool {
        matches!(self, Self::Argument(_))
    }

    /// Returns true if this is a missing-collaborator error.
    #[must_use]
    pub const fn is_collaborator(&self) -> bool {
        matches!(self, Self::Collaborator(_))
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Always false: every failure here is a defect, not a transient condition.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        false
    }
}

/// Result type alias for qhist operations.
pub type QHistResult<T> = Result<T, QHistError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_discount() {
        let err = ConfigError::DiscountOutOfRange { value: 1.5 };
        let msg = format!("{err}");
        assert!(msg.contains("1.5"));
        assert!(msg.contains("out of range"));
    }

    #[test]
    fn test_config_error_too_many_agents() {
        let err = ConfigError::TooManyAgents {
            registered: 3,
            max_players: 2,
        };
        let msg = format!("{err}");
        assert!(msg.contains('3'));
        assert!(msg.contains("max_players is 2"));
    }

    #[test]
    fn test_argument_error_unknown_action() {
        let err = ArgumentError::UnknownAction {
            action: "teleport".to_string(),
        };
        assert!(err.to_string().contains("teleport"));
    }

    #[test]
    fn test_qhist_error_from_config() {
        let err: QHistError = ConfigError::NoPlayers.into();
        assert!(err.is_config());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_qhist_error_from_argument() {
        let err: QHistError = ArgumentError::MissingOwnAction {
            agent: AgentId::new("p0"),
        }
        .into();
        assert!(err.is_argument());
        assert!(err.to_string().contains("p0"));
    }

    #[test]
    fn test_qhist_error_from_collaborator() {
        let err: QHistError = CollaboratorError::Missing { name: "q_store" }.into();
        assert!(err.is_collaborator());
        assert!(err.to_string().contains("q_store"));
    }

    #[test]
    fn test_qhist_error_from_storage() {
        let err: QHistError = StorageError::BackendError("poisoned".to_string()).into();
        assert!(err.is_storage());
        assert!(!err.is_retryable());
    }
}
