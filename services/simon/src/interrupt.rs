//! Ctrl+C handling for the `simon` binary.
//!
//! Installing a Ctrl+C handler keeps SIGINT captured for the rest of the
//! process, so presses are counted instead: the first cancels the game and the
//! second lets the binary quit even while the robot is still being reset.

use std::future::Future;
use std::io;
use tokio::sync::watch;
use tracing::{error, info};

/// Counts interrupt presses seen since startup.
#[derive(Clone)]
pub struct Interrupts {
    presses: watch::Receiver<u32>,
}

impl Interrupts {
    /// Listens for Ctrl+C for the rest of the process.
    pub fn from_ctrl_c() -> Self {
        Self::listen(tokio::signal::ctrl_c)
    }

    /// Counts every successful completion of `next_signal`.
    ///
    /// If the signal source fails, no further presses are counted.
    pub fn listen<F, Fut>(mut next_signal: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = io::Result<()>> + Send,
    {
        let (tx, rx) = watch::channel(0u32);
        tokio::spawn(async move {
            loop {
                if let Err(e) = next_signal().await {
                    error!(error = %e, "Stopped listening for Ctrl+C");
                    return;
                }
                tx.send_modify(|presses| *presses += 1);
                let presses = *tx.borrow();
                if presses == 1 {
                    info!("Received interrupt. Press Ctrl+C again to quit immediately.");
                } else {
                    info!(presses, "Received interrupt");
                }
                if tx.is_closed() {
                    return;
                }
            }
        });
        Self { presses: rx }
    }

    /// Resolves once `n` presses have been seen. Never resolves if the
    /// listener stops first.
    pub fn nth(&self, n: u32) -> impl Future<Output = ()> + use<> {
        let mut presses = self.presses.clone();
        async move {
            if presses.wait_for(|count| *count >= n).await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::{Mutex, mpsc};
    use tokio::time::timeout;

    /// A signal source driven by sending on the returned channel. Dropping
    /// the sender makes the source fail.
    fn manual_source() -> (mpsc::UnboundedSender<()>, Interrupts) {
        let (tx, rx) = mpsc::unbounded_channel::<()>();
        let rx = Arc::new(Mutex::new(rx));
        let interrupts = Interrupts::listen(move || {
            let rx = rx.clone();
            async move {
                rx.lock()
                    .await
                    .recv()
                    .await
                    .ok_or_else(|| io::Error::other("signal source closed"))
            }
        });
        (tx, interrupts)
    }

    async fn resolves(future: impl Future<Output = ()>) -> bool {
        timeout(Duration::from_millis(100), future).await.is_ok()
    }

    #[tokio::test]
    async fn test_first_press_cancels_second_press_quits() {
        let (press, interrupts) = manual_source();
        let cancel = interrupts.nth(1);
        let quit = interrupts.nth(2);

        press.send(()).unwrap();
        assert!(resolves(cancel).await);
        assert!(!resolves(interrupts.nth(2)).await);

        press.send(()).unwrap();
        assert!(resolves(quit).await);
    }

    #[tokio::test]
    async fn test_failed_source_never_resolves() {
        let (press, interrupts) = manual_source();
        press.send(()).unwrap();
        assert!(resolves(interrupts.nth(1)).await);

        drop(press);
        assert!(!resolves(interrupts.nth(2)).await);
    }
}
