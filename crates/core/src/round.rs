//! Round generation.

use crate::config::{ConfigError, GameConfig};
use crate::sensor::{Sensor, SensorCatalog};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// One instruction/response/evaluation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    pub target: Sensor,
    /// Whether the instruction carries the authorization phrase.
    pub authorized: bool,
    /// Set by the response waiter when the target sensor is touched in time.
    pub touch_observed: bool,
}

impl Round {
    pub fn new(target: Sensor, authorized: bool) -> Self {
        Self {
            target,
            authorized,
            touch_observed: false,
        }
    }
}

/// Draws rounds: a uniform target from the catalog and a Bernoulli(p)
/// authorization flag, independent across rounds.
pub struct RoundGenerator {
    catalog: SensorCatalog,
    authorization_probability: f64,
    rng: StdRng,
}

impl RoundGenerator {
    /// Creates a generator; fails on an empty catalog or out-of-range `p`.
    pub fn new(
        catalog: SensorCatalog,
        authorization_probability: f64,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&authorization_probability) {
            return Err(ConfigError::Probability(authorization_probability));
        }
        if catalog.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            catalog,
            authorization_probability,
            rng,
        })
    }

    pub fn from_config(config: &GameConfig) -> Result<Self, ConfigError> {
        Self::new(
            config.sensor_catalog.clone(),
            config.authorization_probability,
            config.seed,
        )
    }

    pub fn next_round(&mut self) -> Round {
        let authorized = self.rng.random_bool(self.authorization_probability);
        // `new` rejects an empty catalog, so the range is never empty.
        let index = self.rng.random_range(0..self.catalog.len());
        let target = self.catalog.entries()[index].sensor;
        Round::new(target, authorized)
    }
}
