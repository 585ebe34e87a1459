//! Session Controller
//!
//! Drives one game from setup to teardown:
//! `Setup → Playing → {Won, Lost, Cancelled} → Teardown → Ended`.
//! A device failure skips the verdict presentation and goes straight to
//! teardown. The touch subscription is released exactly once on every path.

use crate::config::{ConfigError, GameConfig};
use crate::device::{Device, DeviceError, Face, Rgb};
use crate::evaluator::OutcomeEvaluator;
use crate::presenter::InstructionPresenter;
use crate::round::RoundGenerator;
use crate::waiter::ResponseWaiter;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Playing,
    Won,
    Lost,
    Cancelled,
    Teardown,
    Ended,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    Won,
    Lost,
    Cancelled,
    /// The device failed mid-session; no result is credited.
    Aborted(String),
}

/// Final result returned to the caller once the controller reaches `Ended`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub end: SessionEnd,
    pub score: u32,
    pub win_threshold: u32,
}

/// Successful rounds so far, against the number needed to win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scoreboard {
    score: u32,
    win_threshold: u32,
}

impl Scoreboard {
    pub fn new(win_threshold: u32) -> Self {
        Self {
            score: 0,
            win_threshold,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn win_threshold(&self) -> u32 {
        self.win_threshold
    }

    pub fn has_won(&self) -> bool {
        self.score >= self.win_threshold
    }

    /// Credits one success. Returns `true` when this reaches the threshold.
    pub fn record_success(&mut self) -> bool {
        debug_assert!(!self.has_won(), "score credited after the session was won");
        self.score += 1;
        self.has_won()
    }
}

/// The consolation line spoken after a loss.
pub fn consolation(score: u32, win_threshold: u32) -> String {
    if score == 0 {
        "Nice try! Want to play again?".to_string()
    } else if score < win_threshold / 2 {
        format!("Good effort! You got {score} correct. Practice makes perfect!")
    } else {
        format!("So close! You got {score} out of {win_threshold}! Try again!")
    }
}

/// Runs a single Simon Says session against a [`Device`].
///
/// `run` consumes the controller, so a session cannot be replayed.
pub struct SessionController {
    device: Arc<dyn Device>,
    config: GameConfig,
    generator: RoundGenerator,
    presenter: InstructionPresenter,
    evaluator: OutcomeEvaluator,
    scoreboard: Scoreboard,
    phase: Phase,
}

impl SessionController {
    /// Validates `config` and prepares a session; nothing touches the device yet.
    pub fn new(device: Arc<dyn Device>, config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let generator = RoundGenerator::from_config(&config)?;
        let presenter = InstructionPresenter::new(
            config.sensor_catalog.clone(),
            config.authorization_phrase.clone(),
            config.pacing.after_instruction,
        );
        let evaluator = OutcomeEvaluator::new(config.pacing.after_feedback);
        let scoreboard = Scoreboard::new(config.win_threshold);
        Ok(Self {
            device,
            config,
            generator,
            presenter,
            evaluator,
            scoreboard,
            phase: Phase::Setup,
        })
    }

    /// Plays the session until it is won, lost, cancelled, or the device fails.
    ///
    /// `cancel` resolving at any point during setup or play ends the session as
    /// [`SessionEnd::Cancelled`]. Teardown always runs.
    #[instrument(
        name = "simon_session",
        skip_all,
        fields(win_threshold = self.config.win_threshold)
    )]
    pub async fn run(mut self, cancel: impl Future<Output = ()>) -> SessionReport {
        let outcome = tokio::select! {
            result = self.setup_and_play() => result.map(Some),
            () = cancel => Ok(None),
        };

        let end = match outcome {
            Ok(Some(end)) => end,
            Ok(None) => {
                info!("Game interrupted by user");
                SessionEnd::Cancelled
            }
            Err(e) => {
                error!(
                    error = %e,
                    score = self.scoreboard.score(),
                    "Device failure during session"
                );
                SessionEnd::Aborted(e.to_string())
            }
        };

        let presented = match &end {
            SessionEnd::Won => {
                self.enter(Phase::Won);
                self.present_victory().await
            }
            SessionEnd::Lost => {
                self.enter(Phase::Lost);
                self.present_game_over().await
            }
            SessionEnd::Cancelled => {
                self.enter(Phase::Cancelled);
                self.device.speak("Game cancelled. Goodbye!", true).await
            }
            SessionEnd::Aborted(_) => Ok(()),
        };
        if let Err(e) = presented {
            warn!(error = %e, "Failed to present the session result");
        }

        self.teardown().await;
        self.enter(Phase::Ended);

        SessionReport {
            end,
            score: self.scoreboard.score(),
            win_threshold: self.scoreboard.win_threshold(),
        }
    }

    fn enter(&mut self, phase: Phase) {
        info!(from = ?self.phase, to = ?phase, "Session phase changed");
        self.phase = phase;
    }

    async fn setup_and_play(&mut self) -> Result<SessionEnd, DeviceError> {
        self.enter(Phase::Setup);
        let mut waiter = self.setup().await?;
        self.enter(Phase::Playing);
        self.play(&mut waiter).await
    }

    /// Resets the pose, explains the rules, and subscribes to touches.
    async fn setup(&self) -> Result<ResponseWaiter, DeviceError> {
        let device = &*self.device;
        let pause = self.config.pacing.after_intro_line;

        device.halt().await?;
        device.move_head(0.0, 0.0, 0.0, 100.0).await?;
        device.move_arms(70.0, 70.0).await?;
        device.set_led(Rgb::WHITE).await?;
        device.set_volume(100).await?;

        device.display_image(Face::Joy, 1.0).await?;
        let intro = [
            "Hello! Let's play Simon Says!".to_string(),
            format!(
                "Only touch the sensor when I say {} first!",
                self.config.authorization_phrase
            ),
            format!(
                "If I don't say {}, don't touch anything!",
                self.config.authorization_phrase
            ),
            format!(
                "Get {} correct commands to win! Let's begin!",
                self.config.win_threshold
            ),
        ];
        for line in &intro {
            device.speak(line, true).await?;
            sleep(pause).await;
        }

        let (touch_tx, touch_rx) = mpsc::unbounded_channel();
        let handle = device.subscribe_touch(touch_tx).await?;
        info!(subscription = %handle.0, "Touch events registered");

        Ok(ResponseWaiter::new(touch_rx, self.config.response_timeout))
    }

    async fn play(&mut self, waiter: &mut ResponseWaiter) -> Result<SessionEnd, DeviceError> {
        loop {
            info!(
                score = self.scoreboard.score(),
                win_threshold = self.scoreboard.win_threshold(),
                "Starting round"
            );
            let mut round = self.generator.next_round();
            self.presenter.present(&*self.device, &round).await?;
            waiter.wait(&*self.device, &mut round).await?;

            if !self.evaluator.evaluate(&*self.device, &round).await? {
                return Ok(SessionEnd::Lost);
            }
            if self.scoreboard.record_success() {
                return Ok(SessionEnd::Won);
            }
            sleep(self.config.pacing.between_rounds).await;
        }
    }

    async fn present_victory(&self) -> Result<(), DeviceError> {
        let device = &*self.device;
        let beat = self.config.pacing.celebration_beat;
        info!(score = self.scoreboard.score(), "Player won");

        device.display_image(Face::Amazement, 1.0).await?;
        device
            .speak("Congratulations! You won Simon Says! You're amazing!", true)
            .await?;
        for _ in 0..5 {
            device.set_led(Rgb::GREEN).await?;
            device.move_arms(90.0, 90.0).await?;
            device.display_image(Face::Joy, 1.0).await?;
            sleep(beat).await;
            device.set_led(Rgb::YELLOW).await?;
            device.move_arms(50.0, 50.0).await?;
            device.display_image(Face::Amazement, 1.0).await?;
            sleep(beat).await;
        }
        Ok(())
    }

    async fn present_game_over(&self) -> Result<(), DeviceError> {
        let score = self.scoreboard.score();
        let win_threshold = self.scoreboard.win_threshold();
        info!(score, win_threshold, "Game over");

        self.device.display_image(Face::Sadness, 1.0).await?;
        self.device
            .speak(&consolation(score, win_threshold), true)
            .await
    }

    /// Releases the touch subscription and puts the robot back at rest.
    ///
    /// Errors are logged and swallowed so every step gets a chance to run.
    async fn teardown(&mut self) {
        self.enter(Phase::Teardown);
        let device = &*self.device;

        if let Err(e) = device.unsubscribe_all().await {
            warn!(error = %e, "Failed to unregister touch events");
        }

        let steps = [
            device.set_led(Rgb::WHITE).await,
            device.display_image(Face::Default, 1.0).await,
            device.move_head(0.0, 0.0, 0.0, 100.0).await,
            device.move_arms(70.0, 70.0).await,
            device
                .speak("Thanks for playing Simon Says with me!", true)
                .await,
        ];
        for e in steps.into_iter().filter_map(Result::err) {
            warn!(error = %e, "Reset step failed during teardown");
        }
        sleep(self.config.pacing.after_farewell).await;
    }
}
