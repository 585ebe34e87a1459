//! Touch sensors and the catalog of phrases used to name them aloud.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A capacitive touch position on the robot.
///
/// Variant names match the identifiers the robot reports in its touch events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sensor {
    HeadFront,
    HeadLeft,
    HeadRight,
    HeadBack,
    Chin,
    Scruff,
}

impl Sensor {
    pub const ALL: [Sensor; 6] = [
        Sensor::HeadFront,
        Sensor::HeadLeft,
        Sensor::HeadRight,
        Sensor::HeadBack,
        Sensor::Chin,
        Sensor::Scruff,
    ];

    /// The identifier used on the wire and in configuration.
    pub fn id(self) -> &'static str {
        match self {
            Sensor::HeadFront => "HeadFront",
            Sensor::HeadLeft => "HeadLeft",
            Sensor::HeadRight => "HeadRight",
            Sensor::HeadBack => "HeadBack",
            Sensor::Chin => "Chin",
            Sensor::Scruff => "Scruff",
        }
    }

    fn default_phrase(self) -> &'static str {
        match self {
            Sensor::HeadFront => "head front",
            Sensor::HeadLeft => "head left",
            Sensor::HeadRight => "head right",
            Sensor::HeadBack => "head back",
            Sensor::Chin => "chin",
            Sensor::Scruff => "scruff",
        }
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown sensor identifier: '{0}'")]
pub struct UnknownSensor(pub String);

impl FromStr for Sensor {
    type Err = UnknownSensor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sensor::ALL
            .into_iter()
            .find(|sensor| sensor.id() == s)
            .ok_or_else(|| UnknownSensor(s.to_string()))
    }
}

/// One catalog row: the sensor and how it is spoken in an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub sensor: Sensor,
    pub phrase: String,
}

/// The fixed set of sensors a session may ask for.
///
/// Order is preserved so a seeded generator produces the same sequence of
/// targets for the same catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorCatalog {
    entries: Vec<CatalogEntry>,
}

impl SensorCatalog {
    /// Builds a catalog from `(sensor, phrase)` pairs.
    ///
    /// Emptiness and duplicates are checked by [`crate::config::GameConfig::validate`].
    pub fn new(pairs: impl IntoIterator<Item = (Sensor, String)>) -> Self {
        let entries = pairs
            .into_iter()
            .map(|(sensor, phrase)| CatalogEntry { sensor, phrase })
            .collect();
        Self { entries }
    }

    /// Parses the `Id=phrase,Id=phrase` form used by the environment config.
    pub fn parse(list: &str) -> Result<Self, CatalogParseError> {
        let mut pairs = Vec::new();
        for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (id, phrase) = item
                .split_once('=')
                .ok_or_else(|| CatalogParseError::MissingPhrase(item.to_string()))?;
            let sensor = id.trim().parse::<Sensor>()?;
            let phrase = phrase.trim();
            if phrase.is_empty() {
                return Err(CatalogParseError::MissingPhrase(item.to_string()));
            }
            pairs.push((sensor, phrase.to_string()));
        }
        Ok(Self::new(pairs))
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The spoken phrase for a sensor, if it is part of this catalog.
    pub fn phrase(&self, sensor: Sensor) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.sensor == sensor)
            .map(|entry| entry.phrase.as_str())
    }

    /// The first sensor that appears more than once, if any.
    pub fn first_duplicate(&self) -> Option<Sensor> {
        self.entries.iter().enumerate().find_map(|(i, entry)| {
            self.entries[..i]
                .iter()
                .any(|earlier| earlier.sensor == entry.sensor)
                .then_some(entry.sensor)
        })
    }
}

impl Default for SensorCatalog {
    /// All six head, chin and scruff sensors.
    fn default() -> Self {
        Self::new(
            Sensor::ALL
                .into_iter()
                .map(|sensor| (sensor, sensor.default_phrase().to_string())),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogParseError {
    #[error("Catalog entry '{0}' must look like 'Sensor=phrase'")]
    MissingPhrase(String),
    #[error(transparent)]
    UnknownSensor(#[from] UnknownSensor),
}
