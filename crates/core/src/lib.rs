//! Simon Says game core.
//!
//! The game loop is hardware-agnostic: every speech, LED, face, pose, and
//! touch interaction goes through the [`device::Device`] trait, and touches
//! arrive as typed [`touch::TouchEvent`]s on a channel owned by the
//! [`waiter::ResponseWaiter`].

pub mod config;
pub mod device;
pub mod evaluator;
pub mod presenter;
pub mod round;
pub mod sensor;
pub mod session;
pub mod touch;
pub mod waiter;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{ConfigError, GameConfig, MAX_RESPONSE_TIMEOUT, Pacing};
pub use device::{Device, DeviceError, Face, Rgb, SubscriptionHandle};
pub use sensor::{Sensor, SensorCatalog};
pub use session::{SessionController, SessionEnd, SessionReport};
pub use touch::TouchEvent;
