//! Touch events delivered by the device's event subscription.

use crate::sensor::Sensor;
use serde::Deserialize;
use tokio::time::Instant;

/// A single touch on one of the robot's sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchEvent {
    pub sensor: Sensor,
    /// When the event reached this process.
    pub at: Instant,
}

impl TouchEvent {
    pub fn now(sensor: Sensor) -> Self {
        Self {
            sensor,
            at: Instant::now(),
        }
    }
}

/// The only accepted shape for a touch notification body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TouchPayload {
    sensor_position: Sensor,
    #[serde(default = "contacted_by_default")]
    is_contacted: bool,
}

fn contacted_by_default() -> bool {
    true
}

/// A touch notification body that does not match [`TouchPayload`].
#[derive(Debug, thiserror::Error)]
#[error("Malformed touch event: {0}")]
pub struct MalformedTouch(#[from] serde_json::Error);

/// Interprets a touch notification body.
///
/// Returns `Ok(None)` for release notifications (`isContacted: false`), which
/// are well-formed but do not count as touches.
pub fn parse_touch_payload(
    payload: &serde_json::Value,
) -> Result<Option<TouchEvent>, MalformedTouch> {
    let payload = TouchPayload::deserialize(payload)?;
    Ok(payload
        .is_contacted
        .then(|| TouchEvent::now(payload.sensor_position)))
}
