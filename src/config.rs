//! Learning configuration.
//!
//! Fixed for an agent's lifetime. Can be built in code or loaded from JSON.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Hyperparameters of a history-augmented Q-learner.
///
/// # Examples
///
/// ```
/// use qhist::LearningConfig;
///
/// let cfg = LearningConfig::from_json(
///     r#"{"discount": 0.9, "learning_rate": 0.5, "history_size": 2, "max_players": 2}"#,
/// ).unwrap();
/// assert_eq!(cfg.history_size, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Discount factor, in `[0, 1]`.
    pub discount: f64,

    /// Learning rate, in `(0, 1]`.
    pub learning_rate: f64,

    /// Number of past joint actions folded into the state.
    pub history_size: usize,

    /// Size of the player-slot range used by history records.
    pub max_players: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            discount: 0.99,
            learning_rate: 0.1,
            history_size: 1,
            max_players: 2,
        }
    }
}

impl LearningConfig {
    /// Configuration from explicit values; call [`Self::validate`] before use.
    #[must_use]
    pub fn new(discount: f64, learning_rate: f64, history_size: usize, max_players: usize) -> Self {
        Self {
            discount,
            learning_rate,
            history_size,
            max_players,
        }
    }

    /// Parses and validates a JSON configuration. Missing fields take their
    /// default values.
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(s).map_err(|e| ConfigError::Malformed {
            message: format!("deserialize config: {e}"),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Malformed {
            message: format!("serialize config: {e}"),
        })
    }

    /// Checks every range constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(ConfigError::DiscountOutOfRange {
                value: self.discount,
            });
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ConfigError::LearningRateOutOfRange {
                value: self.learning_rate,
            });
        }
        if self.max_players == 0 {
            return Err(ConfigError::NoPlayers);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(LearningConfig::default().validate().is_ok());
    }

    #[test]
    fn test_discount_range() {
        let cfg = LearningConfig::new(1.01, 0.5, 1, 2);
        assert!(matches!(cfg.validate(), Err(ConfigError::DiscountOutOfRange { .. })));
        assert!(LearningConfig::new(0.0, 0.5, 1, 2).validate().is_ok());
        assert!(LearningConfig::new(1.0, 0.5, 1, 2).validate().is_ok());
    }

    #[test]
    fn test_learning_rate_range() {
        assert!(matches!(
            LearningConfig::new(0.9, 0.0, 1, 2).validate(),
            Err(ConfigError::LearningRateOutOfRange { .. })
        ));
        assert!(LearningConfig::new(0.9, f64::NAN, 1, 2).validate().is_err());
        assert!(LearningConfig::new(0.9, 1.0, 1, 2).validate().is_ok());
    }

    #[test]
    fn test_zero_players() {
        assert!(matches!(
            LearningConfig::new(0.9, 0.5, 1, 0).validate(),
            Err(ConfigError::NoPlayers)
        ));
    }

    #[test]
    fn test_zero_history_is_legal() {
        assert!(LearningConfig::new(0.9, 0.5, 0, 1).validate().is_ok());
    }

    #[test]
    fn test_from_json_defaults_and_errors() {
        let cfg = LearningConfig::from_json(r#"{"history_size": 4}"#).unwrap();
        assert_eq!(cfg.history_size, 4);
        assert_eq!(cfg.max_players, 2);

        // Negative history sizes are rejected by the type.
        let err = LearningConfig::from_json(r#"{"history_size": -1}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));

        let err = LearningConfig::from_json(r#"{"discount": 2.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::DiscountOutOfRange { .. }));
    }

    #[test]
    fn test_json_roundtrip() {
        let cfg = LearningConfig::new(0.9, 0.5, 3, 4);
        let json = cfg.to_json_pretty().unwrap();
        assert_eq!(LearningConfig::from_json(&json).unwrap(), cfg);
    }
}
