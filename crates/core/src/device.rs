//! The robot as seen by the game.
//!
//! The game never talks to hardware directly; every side effect goes through
//! [`Device`], which lets the session run against a real robot or a scripted
//! fake in tests.

use crate::touch::TouchEvent;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// An LED color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const YELLOW: Rgb = Rgb::new(255, 255, 0);
    pub const CYAN: Rgb = Rgb::new(0, 255, 255);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const SPRING_GREEN: Rgb = Rgb::new(0, 255, 128);
    pub const ORANGE: Rgb = Rgb::new(255, 165, 0);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
}

/// Face images shipped on the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Default,
    Joy,
    Amazement,
    Sadness,
    Listening,
}

impl Face {
    pub fn file_name(self) -> &'static str {
        match self {
            Face::Default => "e_DefaultContent.jpg",
            Face::Joy => "e_Joy.jpg",
            Face::Amazement => "e_Amazement.jpg",
            Face::Sadness => "e_Sadness.jpg",
            Face::Listening => "e_ContentLeft.jpg",
        }
    }
}

/// Identifies an active touch subscription on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle(pub String);

/// Errors raised while talking to the device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Device unreachable: {0}")]
    Unreachable(String),
    #[error("Device rejected '{command}' with status {status}: {message}")]
    Status {
        command: String,
        status: u16,
        message: String,
    },
    #[error("Event subscription failed: {0}")]
    Subscription(String),
    #[error("Unexpected device response: {0}")]
    Protocol(String),
}

/// Speech, display, LED, pose, and touch subscription primitives.
///
/// Implementations deliver touches by sending on the channel handed to
/// [`Device::subscribe_touch`] from whatever task receives them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Device: Send + Sync {
    /// Speaks `text`, dropping queued speech first when `flush` is set.
    async fn speak(&self, text: &str, flush: bool) -> Result<(), DeviceError>;

    /// Shows a face image; `alpha` is the display layer opacity.
    async fn display_image(&self, face: Face, alpha: f32) -> Result<(), DeviceError>;

    async fn set_led(&self, color: Rgb) -> Result<(), DeviceError>;

    /// Starts forwarding touch events to `sink`.
    async fn subscribe_touch(
        &self,
        sink: mpsc::UnboundedSender<TouchEvent>,
    ) -> Result<SubscriptionHandle, DeviceError>;

    /// Drops every event subscription this device holds.
    async fn unsubscribe_all(&self) -> Result<(), DeviceError>;

    async fn halt(&self) -> Result<(), DeviceError>;

    async fn move_head(
        &self,
        pitch: f32,
        roll: f32,
        yaw: f32,
        velocity: f32,
    ) -> Result<(), DeviceError>;

    async fn move_arms(&self, left: f32, right: f32) -> Result<(), DeviceError>;

    /// Sets the speaker volume, 0 to 100.
    async fn set_volume(&self, level: u8) -> Result<(), DeviceError>;
}
