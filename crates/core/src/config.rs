//! Game configuration passed to the session controller at construction.

use crate::sensor::{Sensor, SensorCatalog};
use std::time::Duration;

/// Longest response window a session accepts.
pub const MAX_RESPONSE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// A configuration value outside its valid range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Authorization probability must be within [0, 1], got {0}")]
    Probability(f64),
    #[error("Win threshold must be at least 1")]
    WinThreshold,
    #[error("Response timeout must be greater than zero and at most one hour, got {0:?}")]
    ResponseTimeout(Duration),
    #[error("Sensor catalog is empty")]
    EmptyCatalog,
    #[error("Sensor {0} appears more than once in the catalog")]
    DuplicateSensor(Sensor),
    #[error("Authorization phrase is empty")]
    EmptyAuthorizationPhrase,
}

/// Pauses that give the robot time to finish speaking between steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Pacing {
    pub after_intro_line: Duration,
    pub after_instruction: Duration,
    pub after_feedback: Duration,
    pub between_rounds: Duration,
    pub celebration_beat: Duration,
    pub after_farewell: Duration,
}

impl Pacing {
    /// No pauses at all; used when driving a fake device.
    pub fn none() -> Self {
        Self {
            after_intro_line: Duration::ZERO,
            after_instruction: Duration::ZERO,
            after_feedback: Duration::ZERO,
            between_rounds: Duration::ZERO,
            celebration_beat: Duration::ZERO,
            after_farewell: Duration::ZERO,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            after_intro_line: Duration::from_secs(2),
            after_instruction: Duration::from_secs(1),
            after_feedback: Duration::from_secs(2),
            between_rounds: Duration::from_secs(1),
            celebration_beat: Duration::from_millis(300),
            after_farewell: Duration::from_secs(2),
        }
    }
}

/// Everything a session needs to know before it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Successful rounds needed to win.
    pub win_threshold: u32,
    /// How long the player has to touch after an instruction.
    pub response_timeout: Duration,
    /// Chance that an instruction carries the authorization phrase.
    pub authorization_probability: f64,
    pub sensor_catalog: SensorCatalog,
    pub authorization_phrase: String,
    /// Fixed seed for the round generator; `None` seeds from the OS.
    pub seed: Option<u64>,
    pub pacing: Pacing,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            win_threshold: 5,
            response_timeout: Duration::from_secs(10),
            authorization_probability: 0.7,
            sensor_catalog: SensorCatalog::default(),
            authorization_phrase: "Simon says".to_string(),
            seed: None,
            pacing: Pacing::default(),
        }
    }
}

impl GameConfig {
    /// Checks every range constraint; called before any device interaction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = self.authorization_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::Probability(p));
        }
        if self.win_threshold == 0 {
            return Err(ConfigError::WinThreshold);
        }
        if self.response_timeout.is_zero() || self.response_timeout > MAX_RESPONSE_TIMEOUT {
            return Err(ConfigError::ResponseTimeout(self.response_timeout));
        }
        if self.sensor_catalog.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        if let Some(sensor) = self.sensor_catalog.first_duplicate() {
            return Err(ConfigError::DuplicateSensor(sensor));
        }
        if self.authorization_phrase.trim().is_empty() {
            return Err(ConfigError::EmptyAuthorizationPhrase);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GameConfig::default();
        assert_eq!(config.win_threshold, 5);
        assert_eq!(config.response_timeout, Duration::from_secs(10));
        assert_eq!(config.authorization_probability, 0.7);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_probability_bounds() {
        for p in [0.0, 1.0, 0.5] {
            let config = GameConfig {
                authorization_probability: p,
                ..Default::default()
            };
            assert_eq!(config.validate(), Ok(()));
        }
        for p in [-0.1, 1.01, f64::NAN] {
            let config = GameConfig {
                authorization_probability: p,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(ConfigError::Probability(_))));
        }
    }

    #[test]
    fn test_invalid_fields() {
        let zero_threshold = GameConfig {
            win_threshold: 0,
            ..Default::default()
        };
        assert_eq!(zero_threshold.validate(), Err(ConfigError::WinThreshold));

        let zero_timeout = GameConfig {
            response_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(
            zero_timeout.validate(),
            Err(ConfigError::ResponseTimeout(Duration::ZERO))
        );

        let endless_timeout = GameConfig {
            response_timeout: Duration::from_secs_f64(1e19),
            ..Default::default()
        };
        assert!(matches!(
            endless_timeout.validate(),
            Err(ConfigError::ResponseTimeout(_))
        ));

        let longest = GameConfig {
            response_timeout: MAX_RESPONSE_TIMEOUT,
            ..Default::default()
        };
        assert_eq!(longest.validate(), Ok(()));

        let empty = GameConfig {
            sensor_catalog: SensorCatalog::new(Vec::new()),
            ..Default::default()
        };
        assert_eq!(empty.validate(), Err(ConfigError::EmptyCatalog));

        let duplicated = GameConfig {
            sensor_catalog: SensorCatalog::parse("Chin=chin,Chin=jaw").unwrap(),
            ..Default::default()
        };
        assert_eq!(
            duplicated.validate(),
            Err(ConfigError::DuplicateSensor(Sensor::Chin))
        );

        let blank_phrase = GameConfig {
            authorization_phrase: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(
            blank_phrase.validate(),
            Err(ConfigError::EmptyAuthorizationPhrase)
        );
    }
}
