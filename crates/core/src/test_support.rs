//! A scripted stand-in for the robot used by the session tests.

use crate::device::{Device, DeviceError, Face, Rgb, SubscriptionHandle};
use crate::sensor::{Sensor, SensorCatalog};
use crate::touch::TouchEvent;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};

/// Everything the controller asked the device to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Speak(String),
    Image(Face),
    Led(Rgb),
    Subscribe,
    UnsubscribeAll,
    Halt,
    Head,
    Arms(f32, f32),
    Volume(u8),
}

/// What the simulated player does in one round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerMove {
    /// Touch the target only when the instruction is authorized.
    Obey,
    /// Touch the target regardless of authorization.
    TouchTarget,
    /// Touch some sensor other than the target.
    TouchOther,
    /// Touch the target while the instruction is still being spoken.
    TouchEarly,
    Withhold,
    /// Press Ctrl+C while the round is live.
    Interrupt,
    /// The event connection dies while the round is live.
    DropSubscription,
}

#[derive(Default)]
struct Script {
    moves: VecDeque<PlayerMove>,
    current: Option<(PlayerMove, Sensor, bool)>,
    sink: Option<mpsc::UnboundedSender<TouchEvent>>,
    interrupt: Option<oneshot::Sender<()>>,
    touched: Vec<Sensor>,
}

pub struct ScriptedDevice {
    calls: Mutex<Vec<Call>>,
    script: Mutex<Script>,
    interrupt_rx: Mutex<Option<oneshot::Receiver<()>>>,
    failing_speech: Option<&'static str>,
}

impl ScriptedDevice {
    /// Rounds beyond the scripted moves are played as [`PlayerMove::Withhold`].
    pub fn new(moves: Vec<PlayerMove>) -> Self {
        let (interrupt_tx, interrupt_rx) = oneshot::channel();
        Self {
            calls: Mutex::new(Vec::new()),
            script: Mutex::new(Script {
                moves: moves.into(),
                interrupt: Some(interrupt_tx),
                ..Default::default()
            }),
            interrupt_rx: Mutex::new(Some(interrupt_rx)),
            failing_speech: None,
        }
    }

    /// Makes `speak` fail for any text containing `fragment`.
    pub fn failing_speech(mut self, fragment: &'static str) -> Self {
        self.failing_speech = Some(fragment);
        self
    }

    /// Resolves when a [`PlayerMove::Interrupt`] is played.
    pub fn interrupt_signal(&self) -> impl Future<Output = ()> + use<> {
        let rx = self.interrupt_rx.lock().unwrap().take();
        async move {
            let fired = match rx {
                Some(rx) => rx.await.is_ok(),
                None => false,
            };
            if !fired {
                std::future::pending::<()>().await;
            }
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    pub fn spoke(&self, text: &str) -> bool {
        self.count(|c| matches!(c, Call::Speak(spoken) if spoken == text)) > 0
    }

    /// Sensors the simulated player touched, in order.
    pub fn touched(&self) -> Vec<Sensor> {
        self.script.lock().unwrap().touched.clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn parse_instruction(text: &str) -> Option<(Sensor, bool)> {
        let catalog = SensorCatalog::default();
        let target = catalog
            .entries()
            .iter()
            .find(|entry| text.ends_with(&format!("touch my {}", entry.phrase)))?
            .sensor;
        Some((target, !text.starts_with("touch my")))
    }
}

impl Script {
    fn touch(&mut self, sensor: Sensor) {
        self.touched.push(sensor);
        if let Some(sink) = &self.sink {
            let _ = sink.send(TouchEvent::now(sensor));
        }
    }

    fn play_live_round(&mut self) {
        let Some((player_move, target, authorized)) = self.current.take() else {
            return;
        };
        let other = Sensor::ALL
            .into_iter()
            .find(|sensor| *sensor != target)
            .unwrap_or(target);
        match player_move {
            PlayerMove::Obey if authorized => self.touch(target),
            PlayerMove::TouchTarget => self.touch(target),
            PlayerMove::TouchOther => self.touch(other),
            PlayerMove::Interrupt => {
                if let Some(tx) = self.interrupt.take() {
                    let _ = tx.send(());
                }
            }
            PlayerMove::DropSubscription => self.sink = None,
            PlayerMove::Obey | PlayerMove::TouchEarly | PlayerMove::Withhold => {}
        }
    }
}

#[async_trait]
impl Device for ScriptedDevice {
    async fn speak(&self, text: &str, _flush: bool) -> Result<(), DeviceError> {
        self.record(Call::Speak(text.to_string()));
        if self.failing_speech.is_some_and(|fragment| text.contains(fragment)) {
            return Err(DeviceError::Unreachable("speech service offline".to_string()));
        }
        if let Some((target, authorized)) = Self::parse_instruction(text) {
            let mut script = self.script.lock().unwrap();
            let player_move = script.moves.pop_front().unwrap_or(PlayerMove::Withhold);
            if player_move == PlayerMove::TouchEarly {
                script.touch(target);
            }
            script.current = Some((player_move, target, authorized));
        }
        Ok(())
    }

    async fn display_image(&self, face: Face, _alpha: f32) -> Result<(), DeviceError> {
        self.record(Call::Image(face));
        Ok(())
    }

    async fn set_led(&self, color: Rgb) -> Result<(), DeviceError> {
        self.record(Call::Led(color));
        if color == Rgb::CYAN {
            self.script.lock().unwrap().play_live_round();
        }
        Ok(())
    }

    async fn subscribe_touch(
        &self,
        sink: mpsc::UnboundedSender<TouchEvent>,
    ) -> Result<SubscriptionHandle, DeviceError> {
        self.record(Call::Subscribe);
        self.script.lock().unwrap().sink = Some(sink);
        Ok(SubscriptionHandle("scripted".to_string()))
    }

    async fn unsubscribe_all(&self) -> Result<(), DeviceError> {
        self.record(Call::UnsubscribeAll);
        self.script.lock().unwrap().sink = None;
        Ok(())
    }

    async fn halt(&self) -> Result<(), DeviceError> {
        self.record(Call::Halt);
        Ok(())
    }

    async fn move_head(
        &self,
        _pitch: f32,
        _roll: f32,
        _yaw: f32,
        _velocity: f32,
    ) -> Result<(), DeviceError> {
        self.record(Call::Head);
        Ok(())
    }

    async fn move_arms(&self, left: f32, right: f32) -> Result<(), DeviceError> {
        self.record(Call::Arms(left, right));
        Ok(())
    }

    async fn set_volume(&self, level: u8) -> Result<(), DeviceError> {
        self.record(Call::Volume(level));
        Ok(())
    }
}
