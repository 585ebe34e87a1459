//! Waits for the player's response to an instruction.

use crate::config::MAX_RESPONSE_TIMEOUT;
use crate::device::{Device, DeviceError, Rgb};
use crate::round::Round;
use crate::touch::TouchEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

/// The single consumer of the device's touch events.
///
/// Touches are only attributed to a round while it is live: arming discards
/// everything that arrived earlier, so a touch during the instruction never
/// counts.
pub struct ResponseWaiter {
    touches: mpsc::UnboundedReceiver<TouchEvent>,
    timeout: Duration,
}

impl ResponseWaiter {
    /// `timeout` is capped at [`MAX_RESPONSE_TIMEOUT`].
    pub fn new(touches: mpsc::UnboundedReceiver<TouchEvent>, timeout: Duration) -> Self {
        Self {
            touches,
            timeout: timeout.min(MAX_RESPONSE_TIMEOUT),
        }
    }

    /// Drops queued touches and returns the instant the window opens.
    fn arm(&mut self) -> Instant {
        let armed_at = Instant::now();
        let mut stale = 0usize;
        while self.touches.try_recv().is_ok() {
            stale += 1;
        }
        if stale > 0 {
            debug!(stale, "Discarded touches received before the round was live");
        }
        armed_at
    }

    /// Blocks until the target is touched or the timeout elapses.
    ///
    /// Sets `round.touch_observed` on a matching touch. Touches on other
    /// sensors are ignored.
    pub async fn wait(
        &mut self,
        device: &dyn Device,
        round: &mut Round,
    ) -> Result<(), DeviceError> {
        let armed_at = self.arm();
        let deadline = armed_at + self.timeout;
        device.set_led(Rgb::CYAN).await?;
        info!(timeout_secs = self.timeout.as_secs_f64(), "Waiting for response");

        loop {
            match timeout_at(deadline, self.touches.recv()).await {
                Ok(Some(event)) if event.at < armed_at => {
                    debug!(
                        sensor = %event.sensor,
                        "Ignoring touch stamped before the window opened"
                    );
                }
                Ok(Some(event)) if event.sensor == round.target => {
                    info!(sensor = %event.sensor, "Target sensor touched");
                    round.touch_observed = true;
                    return Ok(());
                }
                Ok(Some(event)) => {
                    info!(expected = %round.target, got = %event.sensor, "Wrong sensor touched");
                }
                Ok(None) => {
                    warn!("Touch event stream closed while waiting for a response");
                    return Err(DeviceError::Subscription(
                        "touch event stream closed".to_string(),
                    ));
                }
                Err(_) => {
                    debug!("Response window elapsed");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MockDevice;
    use crate::sensor::Sensor;

    fn quiet_device() -> MockDevice {
        let mut device = MockDevice::new();
        device.expect_set_led().returning(|_| Ok(()));
        device
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_touch_waits_for_the_full_timeout() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let mut waiter = ResponseWaiter::new(rx, Duration::from_secs(10));
        let mut round = Round::new(Sensor::Chin, true);

        let started = Instant::now();
        waiter.wait(&quiet_device(), &mut round).await.unwrap();

        assert!(!round.touch_observed);
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_timeout_is_capped() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let mut waiter = ResponseWaiter::new(rx, Duration::from_secs_f64(1e19));
        let mut round = Round::new(Sensor::Chin, true);

        let started = Instant::now();
        waiter.wait(&quiet_device(), &mut round).await.unwrap();

        assert!(!round.touch_observed);
        assert_eq!(started.elapsed(), MAX_RESPONSE_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_matching_touch_returns_early() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut waiter = ResponseWaiter::new(rx, Duration::from_secs(10));
        let mut round = Round::new(Sensor::Chin, false);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            tx.send(TouchEvent::now(Sensor::Chin)).unwrap();
        });

        let started = Instant::now();
        waiter.wait(&quiet_device(), &mut round).await.unwrap();

        assert!(round.touch_observed);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_sensor_never_counts() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut waiter = ResponseWaiter::new(rx, Duration::from_secs(5));
        let mut round = Round::new(Sensor::HeadBack, true);
        let _subscription = tx.clone();

        tokio::spawn(async move {
            for sensor in [Sensor::Chin, Sensor::Scruff, Sensor::HeadFront] {
                tokio::time::sleep(Duration::from_secs(1)).await;
                let _ = tx.send(TouchEvent::now(sensor));
            }
        });

        waiter.wait(&quiet_device(), &mut round).await.unwrap();
        assert!(!round.touch_observed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_touches_before_arming_are_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut waiter = ResponseWaiter::new(rx, Duration::from_secs(2));
        let mut round = Round::new(Sensor::Scruff, true);

        tx.send(TouchEvent::now(Sensor::Scruff)).unwrap();
        tokio::time::advance(Duration::from_millis(500)).await;

        waiter.wait(&quiet_device(), &mut round).await.unwrap();
        assert!(!round.touch_observed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_stream_is_a_subscription_error() {
        let (tx, rx) = mpsc::unbounded_channel::<TouchEvent>();
        drop(tx);
        let mut waiter = ResponseWaiter::new(rx, Duration::from_secs(10));
        let mut round = Round::new(Sensor::Chin, true);

        let started = Instant::now();
        let err = waiter.wait(&quiet_device(), &mut round).await.unwrap_err();

        assert!(matches!(err, DeviceError::Subscription(_)));
        assert!(!round.touch_observed);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_awaiting_indicator_failure_is_reported() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let mut waiter = ResponseWaiter::new(rx, Duration::from_secs(10));
        let mut round = Round::new(Sensor::Chin, true);
        let mut device = MockDevice::new();
        device
            .expect_set_led()
            .returning(|_| Err(DeviceError::Unreachable("gone".to_string())));

        assert!(waiter.wait(&device, &mut round).await.is_err());
    }
}
