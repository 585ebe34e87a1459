//! Turns a round into the spoken instruction and its visual cue.

use crate::device::{Device, DeviceError, Face, Rgb};
use crate::round::Round;
use crate::sensor::SensorCatalog;
use std::time::Duration;
use tracing::info;

/// Builds the instruction for `round`.
///
/// `"<phrase> touch my <sensor>"` when authorized, `"touch my <sensor>"`
/// otherwise. Falls back to the sensor identifier if the catalog has no
/// phrase for the target.
pub fn instruction_text(
    round: &Round,
    catalog: &SensorCatalog,
    authorization_phrase: &str,
) -> String {
    let sensor_phrase = catalog
        .phrase(round.target)
        .map(str::to_string)
        .unwrap_or_else(|| round.target.to_string());
    if round.authorized {
        format!("{authorization_phrase} touch my {sensor_phrase}")
    } else {
        format!("touch my {sensor_phrase}")
    }
}

/// Speaks the instruction for a round and signals that a command is being given.
pub struct InstructionPresenter {
    catalog: SensorCatalog,
    authorization_phrase: String,
    pause: Duration,
}

impl InstructionPresenter {
    pub fn new(catalog: SensorCatalog, authorization_phrase: String, pause: Duration) -> Self {
        Self {
            catalog,
            authorization_phrase,
            pause,
        }
    }

    pub async fn present(&self, device: &dyn Device, round: &Round) -> Result<(), DeviceError> {
        let text = instruction_text(round, &self.catalog, &self.authorization_phrase);
        info!(
            target_sensor = %round.target,
            authorized = round.authorized,
            %text,
            "Giving instruction"
        );

        device.set_led(Rgb::YELLOW).await?;
        device.display_image(Face::Listening, 1.0).await?;
        device.speak(&text, true).await?;
        tokio::time::sleep(self.pause).await;
        Ok(())
    }
}
