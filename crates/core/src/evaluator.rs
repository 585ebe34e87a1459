//! Judges a finished round and shows the player how they did.

use crate::device::{Device, DeviceError, Face, Rgb};
use crate::round::Round;
use std::time::Duration;
use tracing::info;

/// The four possible results of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Authorized instruction, target touched.
    Followed,
    /// Authorized instruction, no touch in time.
    Missed,
    /// Unauthorized instruction, player held back.
    Withheld,
    /// Unauthorized instruction, player touched anyway.
    Tricked,
}

impl Verdict {
    /// Total over both inputs; the only place a round is judged.
    pub fn judge(authorized: bool, touch_observed: bool) -> Self {
        match (authorized, touch_observed) {
            (true, true) => Verdict::Followed,
            (true, false) => Verdict::Missed,
            (false, false) => Verdict::Withheld,
            (false, true) => Verdict::Tricked,
        }
    }

    pub fn of(round: &Round) -> Self {
        Self::judge(round.authorized, round.touch_observed)
    }

    pub fn is_success(self) -> bool {
        matches!(self, Verdict::Followed | Verdict::Withheld)
    }

    fn feedback(self) -> Feedback {
        match self {
            Verdict::Followed => Feedback {
                color: Rgb::GREEN,
                face: Face::Joy,
                speech: "Great job! That's correct!",
            },
            Verdict::Missed => Feedback {
                color: Rgb::ORANGE,
                face: Face::Sadness,
                speech: "Oops! Simon said to touch, but you didn't!",
            },
            Verdict::Withheld => Feedback {
                color: Rgb::SPRING_GREEN,
                face: Face::Joy,
                speech: "Excellent! You didn't fall for my trick!",
            },
            Verdict::Tricked => Feedback {
                color: Rgb::RED,
                face: Face::Sadness,
                speech: "Oh no! I didn't say Simon says! You're out!",
            },
        }
    }
}

struct Feedback {
    color: Rgb,
    face: Face,
    speech: &'static str,
}

/// Judges rounds and renders the per-verdict feedback.
pub struct OutcomeEvaluator {
    pause: Duration,
}

impl OutcomeEvaluator {
    pub fn new(pause: Duration) -> Self {
        Self { pause }
    }

    /// Presents feedback for `round` and returns whether it was a success.
    pub async fn evaluate(
        &self,
        device: &dyn Device,
        round: &Round,
    ) -> Result<bool, DeviceError> {
        let verdict = Verdict::of(round);
        info!(
            ?verdict,
            authorized = round.authorized,
            touched = round.touch_observed,
            "Round judged"
        );

        let feedback = verdict.feedback();
        device.set_led(feedback.color).await?;
        device.display_image(feedback.face, 1.0).await?;
        device.speak(feedback.speech, true).await?;
        tokio::time::sleep(self.pause).await;
        Ok(verdict.is_success())
    }
}
