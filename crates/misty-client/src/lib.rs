//! Misty robot client
//!
//! Implements [`simon_core::Device`] on top of the robot's local REST API
//! (`http://<address>/api/...`) and its `pubsub` WebSocket for touch events.
//! Every call is a direct pass-through; no retries or queuing.

pub mod events;

use async_trait::async_trait;
use events::EventSubscription;
use serde::{Deserialize, Serialize};
use simon_core::{Device, DeviceError, Face, Rgb, SubscriptionHandle, TouchEvent};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};

/// Event name used when registering for touch notifications.
pub const TOUCH_EVENT_NAME: &str = "simon_touch";

/// Connection settings for a robot on the local network.
#[derive(Debug, Clone)]
pub struct MistyConfig {
    /// Host or `host:port`, with or without an `http://` prefix.
    pub address: String,
    pub request_timeout: Duration,
    /// Minimum time between repeated touch notifications from the robot.
    pub debounce_ms: u32,
}

impl MistyConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            request_timeout: Duration::from_secs(10),
            debounce_ms: 250,
        }
    }
}

/// Strips any scheme and trailing slashes from a user-supplied address.
pub fn normalize_address(address: &str) -> Result<String, DeviceError> {
    let trimmed = address.trim();
    let host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .unwrap_or(trimmed)
        .trim_end_matches('/');
    if host.is_empty() || host.contains('/') {
        return Err(DeviceError::Unreachable(format!(
            "'{address}' is not a robot address"
        )));
    }
    Ok(host.to_string())
}

/// Reply body returned by every REST command.
#[derive(Deserialize, Debug)]
struct ApiReply {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SpeakBody<'a> {
    text: &'a str,
    flush: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DisplayImageBody<'a> {
    file_name: &'a str,
    alpha: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct LedBody {
    red: u8,
    green: u8,
    blue: u8,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct MoveHeadBody {
    pitch: f32,
    roll: f32,
    yaw: f32,
    velocity: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct MoveArmsBody {
    left_arm_position: f32,
    right_arm_position: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct VolumeBody {
    volume: u8,
}

#[derive(Serialize)]
struct EmptyBody {}

/// A Misty robot reachable over the local network.
pub struct MistyClient {
    http: reqwest::Client,
    api_base: String,
    events_url: String,
    debounce_ms: u32,
    subscription: Mutex<Option<EventSubscription>>,
}

impl MistyClient {
    pub fn new(config: MistyConfig) -> Result<Self, DeviceError> {
        let host = normalize_address(&config.address)?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DeviceError::Unreachable(e.to_string()))?;
        info!(%host, "Configured robot client");
        Ok(Self {
            http,
            api_base: format!("http://{host}/api"),
            events_url: format!("ws://{host}/pubsub"),
            debounce_ms: config.debounce_ms,
            subscription: Mutex::new(None),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn events_url(&self) -> &str {
        &self.events_url
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        command: &str,
        body: &B,
    ) -> Result<(), DeviceError> {
        let url = format!("{}/{}", self.api_base, command);
        debug!(%url, "Sending robot command");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| DeviceError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DeviceError::Status {
                command: command.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let reply: ApiReply = response
            .json()
            .await
            .map_err(|e| DeviceError::Protocol(format!("{command}: {e}")))?;
        check_reply(command, status.as_u16(), reply)
    }
}

fn check_reply(command: &str, status: u16, reply: ApiReply) -> Result<(), DeviceError> {
    match reply.status.as_deref() {
        None => Ok(()),
        Some(s) if s.eq_ignore_ascii_case("success") => Ok(()),
        Some(s) => Err(DeviceError::Status {
            command: command.to_string(),
            status,
            message: reply.error.unwrap_or_else(|| s.to_string()),
        }),
    }
}

#[async_trait]
impl Device for MistyClient {
    async fn speak(&self, text: &str, flush: bool) -> Result<(), DeviceError> {
        info!(%text, "Speaking");
        self.post("tts/speak", &SpeakBody { text, flush }).await
    }

    async fn display_image(&self, face: Face, alpha: f32) -> Result<(), DeviceError> {
        let body = DisplayImageBody {
            file_name: face.file_name(),
            alpha,
        };
        self.post("images/display", &body).await
    }

    async fn set_led(&self, color: Rgb) -> Result<(), DeviceError> {
        let body = LedBody {
            red: color.red,
            green: color.green,
            blue: color.blue,
        };
        self.post("led", &body).await
    }

    async fn subscribe_touch(
        &self,
        sink: mpsc::UnboundedSender<TouchEvent>,
    ) -> Result<SubscriptionHandle, DeviceError> {
        let mut slot = self.subscription.lock().await;
        if let Some(previous) = slot.take() {
            debug!("Replacing existing touch subscription");
            previous.close().await?;
        }
        let subscription =
            EventSubscription::open(&self.events_url, TOUCH_EVENT_NAME, self.debounce_ms, sink)
                .await?;
        let handle = SubscriptionHandle(subscription.event_name().to_string());
        *slot = Some(subscription);
        Ok(handle)
    }

    async fn unsubscribe_all(&self) -> Result<(), DeviceError> {
        match self.subscription.lock().await.take() {
            Some(subscription) => {
                info!(event_name = subscription.event_name(), "Unregistering touch events");
                subscription.close().await
            }
            None => {
                debug!("No touch subscription to release");
                Ok(())
            }
        }
    }

    async fn halt(&self) -> Result<(), DeviceError> {
        self.post("halt", &EmptyBody {}).await
    }

    async fn move_head(
        &self,
        pitch: f32,
        roll: f32,
        yaw: f32,
        velocity: f32,
    ) -> Result<(), DeviceError> {
        let body = MoveHeadBody {
            pitch,
            roll,
            yaw,
            velocity,
        };
        self.post("head", &body).await
    }

    async fn move_arms(&self, left: f32, right: f32) -> Result<(), DeviceError> {
        let body = MoveArmsBody {
            left_arm_position: left,
            right_arm_position: right,
        };
        self.post("arms/set", &body).await
    }

    async fn set_volume(&self, level: u8) -> Result<(), DeviceError> {
        self.post("audio/volume", &VolumeBody { volume: level.min(100) })
            .await
    }
}
