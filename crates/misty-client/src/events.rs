//! The robot's `pubsub` WebSocket: subscription messages and touch forwarding.

use futures_util::{SinkExt, StreamExt, stream::SplitStream};
use serde::{Deserialize, Serialize};
use simon_core::touch::{MalformedTouch, parse_touch_payload};
use simon_core::{DeviceError, TouchEvent};
use tokio::{net::TcpStream, sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::protocol::Message as WsMessage,
};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = futures_util::stream::SplitSink<WsStream, WsMessage>;

/// Event type the robot uses for its capacitive touch sensors.
pub const TOUCH_SENSOR_EVENT: &str = "TouchSensor";

#[derive(Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct SubscribeRequest<'a> {
    pub operation: &'static str,
    #[serde(rename = "Type")]
    pub event_type: &'a str,
    pub debounce_ms: u32,
    pub event_name: &'a str,
}

impl<'a> SubscribeRequest<'a> {
    pub fn touch(event_name: &'a str, debounce_ms: u32) -> Self {
        Self {
            operation: "subscribe",
            event_type: TOUCH_SENSOR_EVENT,
            debounce_ms,
            event_name,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct UnsubscribeRequest<'a> {
    pub operation: &'static str,
    pub event_name: &'a str,
    pub message: &'static str,
}

impl<'a> UnsubscribeRequest<'a> {
    pub fn new(event_name: &'a str) -> Self {
        Self {
            operation: "unsubscribe",
            event_name,
            message: "",
        }
    }
}

/// Every message on the socket carries the event name and a body.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct EventEnvelope {
    #[serde(default)]
    event_name: Option<String>,
    message: serde_json::Value,
}

/// What a single socket message turned out to be.
#[derive(Debug)]
pub enum Incoming {
    /// A plain-text status line, e.g. the registration acknowledgement.
    Notice(String),
    Touch(TouchEvent),
    /// A sensor was let go; not a touch.
    Release,
    Malformed(MalformedTouch),
    /// Not an event envelope at all.
    Unrecognized(String),
}

/// Interprets one text frame from the socket.
pub fn classify(text: &str) -> Incoming {
    let envelope: EventEnvelope = match serde_json::from_str(text) {
        Ok(envelope) => envelope,
        Err(e) => return Incoming::Unrecognized(e.to_string()),
    };
    match envelope.message {
        serde_json::Value::String(notice) => Incoming::Notice(notice),
        body => match parse_touch_payload(&body) {
            Ok(Some(event)) => Incoming::Touch(event),
            Ok(None) => Incoming::Release,
            Err(e) => {
                debug!(event_name = ?envelope.event_name, "Touch payload did not parse");
                Incoming::Malformed(e)
            }
        },
    }
}

/// A live touch subscription: the write half of the socket and the reader task.
pub struct EventSubscription {
    event_name: String,
    sink: WsSink,
    reader: JoinHandle<()>,
}

impl EventSubscription {
    /// Connects to `url`, registers for touch events, and starts forwarding
    /// them to `touches`.
    pub async fn open(
        url: &str,
        event_name: &str,
        debounce_ms: u32,
        touches: mpsc::UnboundedSender<TouchEvent>,
    ) -> Result<Self, DeviceError> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| DeviceError::Subscription(format!("connect to {url}: {e}")))?;
        let (mut sink, stream) = ws_stream.split();
        info!(%url, "Connected to robot event socket");

        let request = SubscribeRequest::touch(event_name, debounce_ms);
        send_json(&mut sink, &request).await?;

        let reader = tokio::spawn(forward_touches(stream, touches));
        Ok(Self {
            event_name: event_name.to_string(),
            sink,
            reader,
        })
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    /// Unregisters the event and shuts the socket. The reader task is stopped
    /// even if the robot cannot be told.
    pub async fn close(mut self) -> Result<(), DeviceError> {
        let request = UnsubscribeRequest::new(&self.event_name);
        let sent = send_json(&mut self.sink, &request).await;
        let _ = self.sink.close().await;
        self.reader.abort();
        sent
    }
}

async fn send_json<T: Serialize>(sink: &mut WsSink, value: &T) -> Result<(), DeviceError> {
    let text = serde_json::to_string(value).map_err(|e| DeviceError::Protocol(e.to_string()))?;
    sink.send(WsMessage::Text(text.into()))
        .await
        .map_err(|e| DeviceError::Subscription(e.to_string()))
}

/// Reads the socket until it closes, forwarding touches.
///
/// Each frame is handled on its own; a bad frame is logged and skipped.
/// Dropping `touches` on exit tells the waiter the subscription is gone.
async fn forward_touches(
    mut stream: SplitStream<WsStream>,
    touches: mpsc::UnboundedSender<TouchEvent>,
) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => match classify(&text) {
                Incoming::Touch(event) => {
                    info!(sensor = %event.sensor, "Touch detected");
                    if touches.send(event).is_err() {
                        debug!("Touch receiver dropped; stopping event reader");
                        break;
                    }
                }
                Incoming::Release => debug!("Sensor released"),
                Incoming::Notice(notice) => info!(%notice, "Robot event notice"),
                Incoming::Malformed(e) => {
                    warn!(error = %e, raw = %text, "Discarding malformed touch event")
                }
                Incoming::Unrecognized(e) => {
                    warn!(error = %e, raw = %text, "Discarding unrecognized event frame")
                }
            },
            Ok(WsMessage::Close(_)) => {
                info!("Robot closed the event socket");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Event socket failed");
                break;
            }
        }
    }
}
