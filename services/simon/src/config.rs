use simon_core::{GameConfig, SensorCatalog};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
    #[error("Invalid game configuration: {0}")]
    Game(#[from] simon_core::ConfigError),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Robot address from `MISTY_ADDRESS`, if set.
    pub address: Option<String>,
    pub game: GameConfig,
    pub log_level: Level,
}

/// Reads and parses an optional variable; unset or blank yields `None`.
fn parse_var<T>(name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("'{}': {}", raw, e))),
        _ => Ok(None),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// The game settings are validated here so a bad value stops the program
    /// before it talks to the robot.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let defaults = GameConfig::default();

        let address = std::env::var("MISTY_ADDRESS")
            .ok()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        let win_threshold = parse_var::<u32>("SIMON_WIN_SCORE")?.unwrap_or(defaults.win_threshold);

        let response_timeout = match parse_var::<f64>("SIMON_TIMEOUT_SECS")? {
            Some(secs) => Duration::try_from_secs_f64(secs).map_err(|e| {
                ConfigError::InvalidValue("SIMON_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            None => defaults.response_timeout,
        };

        let authorization_probability =
            parse_var::<f64>("SIMON_PROBABILITY")?.unwrap_or(defaults.authorization_probability);

        let sensor_catalog = match std::env::var("SIMON_SENSORS") {
            Ok(list) if !list.trim().is_empty() => SensorCatalog::parse(&list).map_err(|e| {
                ConfigError::InvalidValue("SIMON_SENSORS".to_string(), e.to_string())
            })?,
            _ => defaults.sensor_catalog,
        };

        let authorization_phrase = std::env::var("SIMON_AUTH_PHRASE")
            .ok()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or(defaults.authorization_phrase);

        let seed = parse_var::<u64>("SIMON_SEED")?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let game = GameConfig {
            win_threshold,
            response_timeout,
            authorization_probability,
            sensor_catalog,
            authorization_phrase,
            seed,
            pacing: defaults.pacing,
        };
        game.validate()?;

        Ok(Self {
            address,
            game,
            log_level,
        })
    }
}
